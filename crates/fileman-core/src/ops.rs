use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::protocol::{self, Message, ProtocolError};
use crate::server::ConnectionHandle;
use crate::service::{DirectoryService, OpError};

/// Dispatches directory operation messages to the service and shapes
/// the reply payloads. Every operation failure becomes a reply on the
/// connection; nothing propagates past `handle_message`.
#[derive(Clone)]
pub struct OpsHandler {
    service: Arc<DirectoryService>,
}

impl OpsHandler {
    pub fn new(service: Arc<DirectoryService>) -> Self {
        Self { service }
    }

    /// Process one operation message and send the reply back.
    pub async fn handle_message(&self, msg: Message, handle: &ConnectionHandle) {
        let request_id = msg.header.request_id;

        let result = match msg.header.msg_type {
            protocol::LIST_REQ => self.handle_list(msg, handle).await,
            protocol::CREATE_FILE_REQ => self.handle_create_file(msg, handle).await,
            protocol::CREATE_FOLDER_REQ => self.handle_create_folder(msg, handle).await,
            protocol::DELETE_REQ => self.handle_delete(msg, handle).await,
            protocol::OPEN_REQ => self.handle_open(msg, handle).await,
            _ => {
                warn!(
                    "ops handler: unexpected message type 0x{:02x}",
                    msg.header.msg_type
                );
                return;
            }
        };

        if let Err(e) = result {
            error!("file operation failed: {:#}", e);
            let _ = send_op_error(
                handle,
                request_id,
                "Failed to process request.",
                Some(format!("{:#}", e)),
            )
            .await;
        }
    }

    async fn handle_list(&self, msg: Message, handle: &ConnectionHandle) -> Result<()> {
        let req: protocol::ListRequest = msg
            .parse_json()
            .map_err(|e| anyhow::anyhow!("invalid LIST_REQ: {}", e))?;

        info!("list: {}", req.base_dir);

        let reply = match self.service.list(&req.base_dir) {
            Ok(entries) => Message::json(protocol::LIST_RESP, msg.header.request_id, &entries)?,
            Err(err) => {
                warn!("list {} failed: {}", req.base_dir, err);
                op_error_reply(msg.header.request_id, &err)?
            }
        };
        handle.send_message(&reply).await
    }

    async fn handle_create_file(&self, msg: Message, handle: &ConnectionHandle) -> Result<()> {
        let req: protocol::CreateFileRequest = msg
            .parse_json()
            .map_err(|e| anyhow::anyhow!("invalid CREATE_FILE_REQ: {}", e))?;

        info!("create file: {} in {}", req.filename, req.base_dir);

        let reply = match self
            .service
            .create_file(&req.base_dir, &req.filename, &req.content)
        {
            Ok(message) => ack_reply(msg.header.request_id, message)?,
            Err(err) => {
                warn!("create file failed: {}", err);
                op_error_reply(msg.header.request_id, &err)?
            }
        };
        handle.send_message(&reply).await
    }

    async fn handle_create_folder(&self, msg: Message, handle: &ConnectionHandle) -> Result<()> {
        let req: protocol::CreateFolderRequest = msg
            .parse_json()
            .map_err(|e| anyhow::anyhow!("invalid CREATE_FOLDER_REQ: {}", e))?;

        info!("create folder: {} in {}", req.foldername, req.base_dir);

        let reply = match self.service.create_folder(&req.base_dir, &req.foldername) {
            Ok(message) => ack_reply(msg.header.request_id, message)?,
            Err(err) => {
                warn!("create folder failed: {}", err);
                op_error_reply(msg.header.request_id, &err)?
            }
        };
        handle.send_message(&reply).await
    }

    async fn handle_delete(&self, msg: Message, handle: &ConnectionHandle) -> Result<()> {
        let req: protocol::DeleteRequest = msg
            .parse_json()
            .map_err(|e| anyhow::anyhow!("invalid DELETE_REQ: {}", e))?;

        info!("delete: {} in {}", req.name, req.base_dir);

        let reply = match self.service.delete(&req.base_dir, &req.name) {
            Ok(message) => ack_reply(msg.header.request_id, message)?,
            Err(err) => {
                warn!("delete failed: {}", err);
                op_error_reply(msg.header.request_id, &err)?
            }
        };
        handle.send_message(&reply).await
    }

    async fn handle_open(&self, msg: Message, handle: &ConnectionHandle) -> Result<()> {
        let req: protocol::OpenRequest = msg
            .parse_json()
            .map_err(|e| anyhow::anyhow!("invalid OPEN_REQ: {}", e))?;

        info!("open: {} in {}", req.filename, req.base_dir);

        let reply = match self.service.open(&req.base_dir, &req.filename) {
            Ok(content) => Message::json(
                protocol::OPEN_RESP,
                msg.header.request_id,
                &protocol::FileContent { content },
            )?,
            Err(err) => {
                // Open reports a single opaque failure; the underlying
                // error goes to the log only.
                error!(
                    "open failed: {}",
                    err.detail().unwrap_or_else(|| err.to_string())
                );
                Message::json(
                    protocol::OPEN_ERROR,
                    msg.header.request_id,
                    &protocol::OpenFailure {
                        error: err.to_string(),
                    },
                )?
            }
        };
        handle.send_message(&reply).await
    }
}

fn ack_reply(request_id: u32, message: String) -> Result<Message, ProtocolError> {
    Message::json(
        protocol::OP_RESULT,
        request_id,
        &protocol::OpResult {
            message,
            error: None,
        },
    )
}

fn op_error_reply(request_id: u32, err: &OpError) -> Result<Message, ProtocolError> {
    Message::json(
        protocol::OP_ERROR,
        request_id,
        &protocol::OpResult {
            message: err.to_string(),
            error: err.detail(),
        },
    )
}

async fn send_op_error(
    handle: &ConnectionHandle,
    request_id: u32,
    message: &str,
    error: Option<String>,
) -> Result<()> {
    let reply = Message::json(
        protocol::OP_ERROR,
        request_id,
        &protocol::OpResult {
            message: message.to_string(),
            error,
        },
    )?;
    handle.send_message(&reply).await
}
