//! Minimal HTTPS requests over a transparent SSL socket.
//!
//! Requests always ask the server to close the connection, and the response
//! is collected verbatim: no chunk decoding, no redirects, no keep-alive.

use core::fmt::Write;

use heapless::String;

use crate::client::Client;
use crate::config::ModemConfig;
use crate::error::Error;
use crate::helpers::{find, utf8_prefix};
use crate::ssl::SslMode;
use crate::traits::Transport;

/// Capacity of the request line plus headers.
pub const MAX_REQUEST_HEAD_LEN: usize = 512;

const USER_AGENT: &str = "QuectelEC200U/1.0";
const HEADER_END: &[u8] = b"\r\n\r\n";
const LAST_CHUNK: &[u8] = b"\r\n0\r\n\r\n";

/// Bytes collected for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HttpResponse {
    /// Number of bytes written to the output buffer, headers included
    pub len: usize,
    /// Whether the end of the response was recognized before the deadline
    pub complete: bool,
}

/// Whether `response` holds a complete HTTP response: the headers ended and
/// either `Content-Length` bytes of body followed or the chunked terminator
/// was seen.
pub fn response_complete(response: &[u8]) -> bool {
    let Some(end) = find(response, HEADER_END) else {
        return false;
    };
    let head = utf8_prefix(&response[..end]);
    let body = &response[end + HEADER_END.len()..];

    if let Some(length) = header(head, "Content-Length") {
        return length
            .parse::<usize>()
            .map(|length| body.len() >= length)
            .unwrap_or(false);
    }

    match header(head, "Transfer-Encoding") {
        Some(encoding) if encoding.eq_ignore_ascii_case("chunked") => {
            // The terminating CRLF of the header block doubles as the one
            // preceding the last chunk of an empty body.
            response.ends_with(LAST_CHUNK)
        }
        _ => false,
    }
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

fn check_header_value(value: &str) -> Result<(), Error> {
    if value.is_empty() || value.contains(['\r', '\n']) {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: ModemConfig,
{
    /// `GET https://{host}{path}` on the connected socket, collecting the
    /// response into `out`.
    pub async fn https_get(
        &mut self,
        host: &str,
        path: &str,
        out: &mut [u8],
    ) -> Result<HttpResponse, Error> {
        check_header_value(host)?;
        check_header_value(path)?;

        let mut head: String<MAX_REQUEST_HEAD_LEN> = String::new();
        write!(
            head,
            "GET {} HTTP/1.1\r\n\
             Host: {}\r\n\
             User-Agent: {}\r\n\
             Accept: */*\r\n\
             Connection: close\r\n\r\n",
            path, host, USER_AGENT
        )?;

        self.send_data(head.as_bytes()).await?;
        self.collect_response(out).await
    }

    /// `POST` `body` to `https://{host}{path}` on the connected socket,
    /// collecting the response into `out`.
    pub async fn https_post(
        &mut self,
        host: &str,
        path: &str,
        content_type: &str,
        body: &[u8],
        out: &mut [u8],
    ) -> Result<HttpResponse, Error> {
        check_header_value(host)?;
        check_header_value(path)?;
        check_header_value(content_type)?;

        let mut head: String<MAX_REQUEST_HEAD_LEN> = String::new();
        write!(
            head,
            "POST {} HTTP/1.1\r\n\
             Host: {}\r\n\
             User-Agent: {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Accept: */*\r\n\
             Connection: close\r\n\r\n",
            path,
            host,
            USER_AGENT,
            content_type,
            body.len()
        )?;

        self.send_data(head.as_bytes()).await?;
        if !body.is_empty() {
            self.send_data(body).await?;
        }
        self.collect_response(out).await
    }

    async fn collect_response(&mut self, out: &mut [u8]) -> Result<HttpResponse, Error> {
        let deadline = self.transport.now() + C::HTTP_TIMEOUT;
        let mut len = 0;

        while len < out.len() {
            let n = self.receive(&mut out[len..]).await?;
            len += n;

            if n > 0 && response_complete(&out[..len]) {
                debug!("HTTP response complete, {} bytes", len);
                return Ok(HttpResponse {
                    len,
                    complete: true,
                });
            }

            // The peer hung up, nothing more will arrive.
            if self.ssl.mode != SslMode::Transparent {
                break;
            }
            if self.transport.now() >= deadline {
                break;
            }
            self.transport.delay(C::HTTP_POLL_INTERVAL).await;
        }

        let complete = response_complete(&out[..len]);
        if !complete {
            warn!("HTTP response incomplete after {} bytes", len);
        }
        Ok(HttpResponse { len, complete })
    }
}
