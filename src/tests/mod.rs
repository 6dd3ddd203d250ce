mod events;
mod router;
