//! Newline-delimited JSON framing.
//!
//! One message per line. A line longer than [`MAX_MESSAGE_BYTES`] is a
//! protocol error on both the reading and the writing side.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::ipc::errors::IpcError;

pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Serialize a message into a single terminated line.
pub fn encode<T: Serialize>(msg: &T) -> Result<String, IpcError> {
    let mut line = serde_json::to_string(msg)
        .map_err(|e| IpcError::ProtocolError(format!("serialization failed: {}", e)))?;

    if line.len() >= MAX_MESSAGE_BYTES {
        return Err(IpcError::ProtocolError(format!(
            "message of {} bytes exceeds the {} byte limit",
            line.len(),
            MAX_MESSAGE_BYTES
        )));
    }

    line.push('\n');
    Ok(line)
}

pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, IpcError> {
    serde_json::from_str(line.trim_end())
        .map_err(|e| IpcError::ProtocolError(format!("invalid JSON message: {}", e)))
}

/// Read one line from a blocking reader. `Ok(None)` means the peer closed.
pub fn read_line<R: std::io::BufRead>(reader: &mut R) -> Result<Option<String>, IpcError> {
    use std::io::{BufRead, Read};

    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_MESSAGE_BYTES as u64)
        .read_line(&mut line)?;
    finish_line(line, read)
}

/// Read and decode one message from an async reader.
pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, IpcError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    use tokio::io::{AsyncBufReadExt, AsyncReadExt};

    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_MESSAGE_BYTES as u64)
        .read_line(&mut line)
        .await?;

    match finish_line(line, read)? {
        Some(line) => decode(&line).map(Some),
        None => Ok(None),
    }
}

/// Encode and write one message to an async writer.
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    use tokio::io::AsyncWriteExt;

    let line = encode(msg)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn finish_line(line: String, read: usize) -> Result<Option<String>, IpcError> {
    if read == 0 {
        return Ok(None);
    }

    if !line.ends_with('\n') {
        if read >= MAX_MESSAGE_BYTES {
            return Err(IpcError::ProtocolError(format!(
                "message exceeds the {} byte limit",
                MAX_MESSAGE_BYTES
            )));
        }
        return Err(IpcError::ProtocolError(
            "connection closed mid-message".to_string(),
        ));
    }

    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::messages::ClientMessage;
    use std::io::Cursor;

    #[test]
    fn test_encode_terminates_line() {
        let line = encode(&ClientMessage::Ping {
            id: "req-1".to_string(),
        })
        .unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_encode_rejects_oversized_message() {
        let msg = ClientMessage::OpenLinks {
            id: "req-1".to_string(),
            activation: "act-1".to_string(),
            links: vec!["x".repeat(MAX_MESSAGE_BYTES)],
        };
        assert!(matches!(encode(&msg), Err(IpcError::ProtocolError(_))));
    }

    #[test]
    fn test_read_line_reports_eof() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert!(read_line(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_read_line_rejects_truncated_message() {
        let mut reader = Cursor::new(br#"{"type":"ping""#.to_vec());
        let err = read_line(&mut reader).unwrap_err();
        assert!(err.to_string().contains("mid-message"), "got: {}", err);
    }

    #[test]
    fn test_read_line_rejects_oversized_line() {
        let mut data = vec![b'a'; MAX_MESSAGE_BYTES + 10];
        data.push(b'\n');
        let mut reader = Cursor::new(data);
        let err = read_line(&mut reader).unwrap_err();
        assert!(err.to_string().contains("byte limit"), "got: {}", err);
    }

    #[test]
    fn test_read_line_reads_one_message_at_a_time() {
        let mut reader = Cursor::new(b"first\nsecond\n".to_vec());
        assert_eq!(read_line(&mut reader).unwrap().as_deref(), Some("first\n"));
        assert_eq!(read_line(&mut reader).unwrap().as_deref(), Some("second\n"));
        assert!(read_line(&mut reader).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_async_message_exchange() {
        let (client, server) = tokio::io::duplex(1024);
        let (_, mut client_writer) = tokio::io::split(client);
        let (server_reader, _) = tokio::io::split(server);
        let mut server_reader = tokio::io::BufReader::new(server_reader);

        let sent = ClientMessage::OpenLinks {
            id: "req-7".to_string(),
            activation: "act-7".to_string(),
            links: vec!["gopeed://x".to_string(), "--flag".to_string()],
        };
        write_message(&mut client_writer, &sent).await.unwrap();
        drop(client_writer);

        let received: Option<ClientMessage> = read_message(&mut server_reader).await.unwrap();
        assert_eq!(received, Some(sent));
    }

    #[tokio::test]
    async fn test_async_read_invalid_json() {
        let mut reader = tokio::io::BufReader::new(&b"not-json{\n"[..]);
        let result: Result<Option<ClientMessage>, _> = read_message(&mut reader).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid JSON"), "got: {}", err);
    }
}
