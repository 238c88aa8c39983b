//! QR target URLs: `<client-base>/login?session_id=<id>&email=<teacher-email>`.

use url::Url;

/// What a scanned code points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrTarget {
    pub session_id: String,
    pub teacher_email: String,
}

/// Builds the URL a session's QR code encodes. Query values are form-encoded.
pub fn target_url(client_base: &str, session_id: &str, teacher_email: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&format!("{}/login", client_base.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("session_id", session_id)
        .append_pair("email", teacher_email);
    Ok(url.into())
}

/// Reads a scanned payload back into its target. Anything that is not a login URL
/// carrying both parameters yields `None`.
pub fn parse_target(payload: &str) -> Option<QrTarget> {
    let url = Url::parse(payload.trim()).ok()?;
    if !url.path().trim_end_matches('/').ends_with("/login") {
        return None;
    }

    let mut session_id = None;
    let mut teacher_email = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "session_id" => session_id = Some(value.into_owned()),
            "email" => teacher_email = Some(value.into_owned()),
            _ => {}
        }
    }

    match (session_id, teacher_email) {
        (Some(session_id), Some(teacher_email)) if !session_id.is_empty() && !teacher_email.is_empty() => {
            Some(QrTarget {
                session_id,
                teacher_email,
            })
        }
        _ => None,
    }
}
