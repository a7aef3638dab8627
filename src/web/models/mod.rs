pub mod websocket_models;
