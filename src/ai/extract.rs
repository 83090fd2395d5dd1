//! Candidate move extraction from a successful reply

use super::error::AttemptFailure;
use super::transport::Reply;

/// Take the first choice's content (or the proxy's `move`), trimmed
///
/// Missing or blank text is [`AttemptFailure::EmptyResponse`], which fails the
/// current attempt only.
pub fn extract_move(reply: &Reply) -> Result<String, AttemptFailure> {
    let text = match reply {
        Reply::Completion(completion) => completion
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref()),
        Reply::Proxied(proxied) => proxied.san.as_deref(),
    };

    match text.map(str::trim) {
        Some(candidate) if !candidate.is_empty() => Ok(candidate.to_string()),
        _ => Err(AttemptFailure::EmptyResponse),
    }
}
