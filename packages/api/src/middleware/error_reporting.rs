use axum::{extract::Request, middleware::Next, response::Response};

use crate::{error::ErrorReport, middleware::jwt::AppUser};

const REDACTED: &str = "[REDACTED]";
const MAX_LEN: usize = 8 * 1024;

/// Hides what this service can leak into a report: database URL userinfo,
/// bearer tokens (sessions and the dispatch token) and `token=` values.
pub(crate) fn sanitize(input: &str) -> String {
    const MARKERS: [&str; 3] = ["://", "Bearer ", "token="];

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some((at, marker)) = MARKERS
        .iter()
        .filter_map(|m| rest.find(m).map(|i| (i, *m)))
        .min_by_key(|(i, _)| *i)
    {
        let value_start = at + marker.len();
        out.push_str(&rest[..value_start]);

        let tail = &rest[value_start..];
        let end = tail
            .find(|c: char| c.is_whitespace() || c == '&' || c == '"')
            .unwrap_or(tail.len());
        let secret_len = if marker == "://" {
            // userinfo ends at the last '@' of the authority
            let authority = &tail[..tail[..end].find('/').unwrap_or(end)];
            authority.rfind('@').unwrap_or(0)
        } else {
            end
        };

        if secret_len > 0 {
            out.push_str(REDACTED);
        }
        rest = &tail[secret_len..];
    }
    out.push_str(rest);

    if out.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
    }
    out
}

/// Logs reportable failures with request context. The response is passed
/// through untouched.
pub async fn error_reporting_middleware(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    // jwt middleware runs first
    let user_id = req.extensions().get::<AppUser>().and_then(|u| match u {
        AppUser::Session(u) => Some(u.sub.clone()),
        AppUser::Unauthorized => None,
    });

    let mut response = next.run(req).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    let details = report.details.as_deref().map(sanitize);
    tracing::error!(
        error_id = %report.id,
        status_code = report.status_code,
        public_code = %report.public_code,
        method = %method,
        path = %path,
        user_id = user_id.as_deref().unwrap_or(""),
        details = details.as_deref().unwrap_or(""),
        "{}", sanitize(&report.summary)
    );

    response
}
