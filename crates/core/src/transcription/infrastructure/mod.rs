pub mod http_transcription_service;
pub mod transcription_poller;
