pub mod by_message_id;
