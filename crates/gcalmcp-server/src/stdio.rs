//! Stdio transport: one JSON-RPC message per line on stdin, one response per
//! line on stdout.
//!
//! Stdio has no per-message headers, so every tool call uses the access token
//! given at startup.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use gcalmcp_protocol::{ErrorCode, JsonRpcError, JsonRpcResponse, ProtocolError, encode_line};

use crate::error::ServerResult;
use crate::handler::RequestHandler;

/// Serves the process's stdin/stdout until stdin closes.
pub async fn serve_stdio(handler: RequestHandler, access_token: Option<String>) -> ServerResult<()> {
    info!("stdio transport ready");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(stdin, stdout, handler, access_token).await
}

/// Serves newline-delimited messages from `reader`, writing responses to
/// `writer`.
pub async fn serve_lines<R, W>(
    mut reader: R,
    mut writer: W,
    handler: RequestHandler,
    access_token: Option<String>,
) -> ServerResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).await?;
        if read == 0 {
            debug!("stdin closed");
            return Ok(());
        }
        if line.trim_ascii().is_empty() {
            continue;
        }

        if let Some(response) = handler
            .handle_message(&line, access_token.as_deref())
            .await
        {
            writer.write_all(&encode_response(&response)?).await?;
            writer.flush().await?;
        }
    }
}

/// Frames `response`, replacing a reply too large for one line with an
/// internal error for the same id so the loop keeps serving.
fn encode_response(response: &JsonRpcResponse) -> ServerResult<Vec<u8>> {
    match encode_line(response) {
        Err(ProtocolError::MessageTooLarge { size, max }) => {
            warn!(size, max, "response too large, sending an error instead");
            let error = JsonRpcError::new(
                ErrorCode::InternalError,
                format!("response too large: {} bytes (max: {})", size, max),
            );
            Ok(encode_line(&JsonRpcResponse::failure(response.id.clone(), error))?)
        }
        other => Ok(other?),
    }
}
