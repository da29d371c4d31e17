//! End-to-end client flows against the in-memory transport

use wasmgatt_core::{
    protocol::sprite::SpriteStatus,
    protocol::upload::UploadPacket,
    uuids::{sprite, wasm},
    Bitmap, EncodingError, MockTransport, ProtocolConfig, RemoteError,
    SpriteClient, UploadCommand, WasmClient, WasmErrorCode, WasmGattError, WasmStatus, WriteMode,
};

fn immediate_client(mock: &MockTransport) -> WasmClient<&MockTransport> {
    WasmClient::new(mock, ProtocolConfig::immediate())
}

#[tokio::test]
async fn test_upload_512_bytes_in_244_byte_chunks() {
    let mock = MockTransport::new();
    let data: Vec<u8> = (0..=255u8).chain(0..=255u8).collect();

    immediate_client(&mock)
        .uploader()
        .upload(&data, 244)
        .await
        .expect("upload should succeed");

    let writes = mock.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|w| w.characteristic == wasm::UPLOAD));
    assert!(writes.iter().all(|w| w.mode == WriteMode::WithResponse));

    let packets: Vec<UploadPacket> = writes
        .iter()
        .map(|w| UploadPacket::from_wire_format(&w.data).unwrap())
        .collect();

    let summary: Vec<(UploadCommand, u8, usize)> = packets
        .iter()
        .map(|p| (p.header.command, p.header.sequence, p.payload.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (UploadCommand::Start, 0, 244),
            (UploadCommand::Continue, 1, 244),
            (UploadCommand::Continue, 2, 24),
        ]
    );

    let reassembled: Vec<u8> = packets.iter().flat_map(|p| p.payload.clone()).collect();
    assert_eq!(reassembled, data);
}

#[tokio::test]
async fn test_empty_upload_sends_single_start() {
    let mock = MockTransport::new();
    immediate_client(&mock).upload(&[]).await.unwrap();

    assert_eq!(
        mock.writes_to(wasm::UPLOAD),
        vec![vec![0x01, 0x00, 0, 0, 0, 0, 0, 0]]
    );
}

#[tokio::test]
async fn test_upload_then_execute() {
    let mock = MockTransport::new();
    mock.push_read(wasm::RESULT, vec![5, 0, 55, 0, 0, 0]);

    let module = b"\0asm\x01\0\0\0".to_vec();
    let value = immediate_client(&mock)
        .upload_and_execute(&module, "add", &[5, 7])
        .await
        .unwrap();
    assert_eq!(value, 55);

    let writes = mock.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].characteristic, wasm::UPLOAD);
    assert_eq!(writes[1].characteristic, wasm::EXECUTE);

    let request = wasmgatt_core::ExecuteRequest::decode(&writes[1].data).unwrap();
    assert_eq!(request.name(), "add");
    assert_eq!(request.arg_count, 2);
    assert_eq!(request.args, [5, 7, 0, 0]);
}

#[tokio::test]
async fn test_remote_execution_error() {
    let mock = MockTransport::new();
    mock.push_read(wasm::RESULT, vec![u8::from(WasmStatus::Error), 5, 0, 0, 0, 0]);

    let err = immediate_client(&mock).execute("missing", &[]).await.unwrap_err();
    assert_eq!(
        err,
        WasmGattError::Remote(RemoteError::ExecutionFailed {
            error_code: WasmErrorCode::FunctionNotFound
        })
    );
    assert!(!err.is_local());
}

#[tokio::test]
async fn test_result_value_returned_unless_error() {
    for status in [
        WasmStatus::Loaded,
        WasmStatus::Executing,
        WasmStatus::Unknown(0x07),
    ] {
        let mock = MockTransport::new();
        mock.push_read(wasm::RESULT, vec![u8::from(status), 0, 55, 0, 0, 0]);

        assert_eq!(immediate_client(&mock).execute("f", &[]).await, Ok(55));
    }
}

#[tokio::test]
async fn test_status_snapshot() {
    let mock = MockTransport::new();
    let mut status: Vec<u8> = vec![WasmStatus::Loaded.into(), 0];
    status.extend_from_slice(&512u16.to_le_bytes());
    status.extend_from_slice(&512u32.to_le_bytes());
    status.extend_from_slice(&42u32.to_le_bytes());
    status.extend_from_slice(&[0; 6]);
    mock.set_value(wasm::STATUS, status);

    let report = immediate_client(&mock).status().await.unwrap();
    assert!(report.status.is_ready());
    assert_eq!(report.bytes_received, 512);
    assert_eq!(report.uptime_secs, 42);
}

#[tokio::test]
async fn test_encoding_errors_write_nothing() {
    let mock = MockTransport::new();
    let client = immediate_client(&mock);

    assert!(matches!(
        client.uploader().upload(&[1, 2, 3], 0).await,
        Err(WasmGattError::Encoding(EncodingError::ChunkSizeZero))
    ));
    assert!(matches!(
        client.execute(&"n".repeat(33), &[]).await,
        Err(WasmGattError::Encoding(EncodingError::NameTooLong { len: 33, max: 32 }))
    ));
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn test_sprite_upload_then_download() {
    let mock = MockTransport::new();
    let client = SpriteClient::new(&mock);
    let bitmap = Bitmap::digit(4);

    client.upload(12, &bitmap).await.unwrap();

    let mut stored = mock.writes_to(sprite::UPLOAD).remove(0);
    stored.push(SpriteStatus::Success as u8);
    mock.push_read(sprite::DOWNLOAD_RESPONSE, stored);

    assert_eq!(client.download(12).await.unwrap(), bitmap);
}
