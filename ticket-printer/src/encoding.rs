//! Windows-1252 encoding utilities for Latin thermal printers
//!
//! Tickets are composed as UTF-8 strings. Most ESC/POS printers sold for
//! Portuguese-speaking markets ship with the WPC1252 code page, so text is
//! converted to Windows-1252 right before it leaves the process, leaving
//! ESC/POS commands untouched.

use tracing::instrument;

/// `ESC t n` page number of WPC1252 on Epson-compatible printers
pub const CODE_PAGE_WPC1252: u8 = 16;

const SELECT_CODE_PAGE: [u8; 3] = [0x1B, 0x74, CODE_PAGE_WPC1252];

/// Convert ticket text (with ESC/POS commands) to Windows-1252 bytes
///
/// ASCII bytes (0x00-0x7F) are copied as is, which keeps every ESC/POS
/// command intact. Only non-ASCII runs are re-encoded; characters outside
/// the code page print as `?`.
///
/// The WPC1252 code page is selected at the start and again after every
/// INIT command (ESC @), since INIT resets the printer to its default page.
#[instrument(skip(text), fields(len = text.len()))]
pub fn encode_cp1252(text: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(text.len() + 8);
    result.extend_from_slice(&SELECT_CODE_PAGE);

    let mut pending = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1B' && chars.peek() == Some(&'@') {
            chars.next();
            flush_pending(&mut pending, &mut result);
            result.extend_from_slice(&[0x1B, 0x40]);
            result.extend_from_slice(&SELECT_CODE_PAGE);
            continue;
        }

        if ch.is_ascii() {
            flush_pending(&mut pending, &mut result);
            result.push(ch as u8);
        } else {
            pending.push(ch);
        }
    }

    flush_pending(&mut pending, &mut result);
    result
}

/// Flush buffered non-ASCII text as Windows-1252
fn flush_pending(pending: &mut String, result: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }

    let mut buf = [0u8; 4];
    for ch in pending.chars() {
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if had_errors {
            result.push(b'?');
        } else {
            result.extend_from_slice(&encoded);
        }
    }
    pending.clear();
}
