use warp::{reject::Rejection, Filter};

use crate::error::ApiError;

use super::jwt::{SessionData, SessionKeys};

/// Extracts the token from `Authorization: Token <jwt>` or `Bearer <jwt>`.
fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        || token.is_empty()
    {
        return None;
    }

    Some(token)
}

fn verify_header(header: &str, keys: &SessionKeys) -> Result<SessionData, Rejection> {
    let token = parse_authorization(header)
        .ok_or_else(|| ApiError::InvalidSession.new("Invalid session; Malformed authorization header"))?;

    Ok(keys.verify_jwt_session(token)?.into())
}

pub fn with_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            match header {
                Some(header) => verify_header(&header, &keys),
                None => Err(ApiError::InvalidSession.default().into()),
            }
        }
    })
}

/// Anonymous requests pass through as `None`; a present but invalid token is
/// still rejected.
pub fn with_possible_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            match header {
                Some(header) => verify_header(&header, &keys).map(Some),
                None => Ok(None),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Token abc.def.ghi", Some("abc.def.ghi"))]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("token  abc ", Some("abc"))]
    #[case("Basic abc", None)]
    #[case("Token ", None)]
    #[case("abc.def.ghi", None)]
    fn authorization_headers(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_authorization(header), expected);
    }
}
