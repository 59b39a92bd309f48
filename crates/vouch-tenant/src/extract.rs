//! Tenancy extraction from HTTP requests.

use crate::config::TenancyConfig;
use crate::error::TenancyError;
use http::Request;
use std::str::FromStr;
use vouch_core::{AppId, EnvironmentId, OrganizationId, TenancyContext};

/// Extract the tenancy context from the HTTP request.
///
/// A `TenancyContext` already present in the request extensions (set by an
/// upstream authentication middleware) wins over headers.
///
/// # Errors
///
/// Returns `TenancyError::AppMissing` if no app header is present.
/// Returns `TenancyError::InvalidFormat` if any tenancy header is not a UUID.
pub fn extract_tenancy<B>(
    req: &Request<B>,
    config: &TenancyConfig,
) -> Result<TenancyContext, TenancyError> {
    if let Some(tenancy) = req.extensions().get::<TenancyContext>() {
        return Ok(*tenancy);
    }

    let app_id: Option<AppId> = header_id(req, &config.app_header)?;
    let environment_id: Option<EnvironmentId> = header_id(req, &config.environment_header)?;
    let organization_id: Option<OrganizationId> = header_id(req, &config.organization_header)?;

    TenancyContext::resolve(app_id, environment_id, organization_id)
        .map_err(|_| TenancyError::AppMissing)
}

/// Read an optional typed ID from a header. Absent or blank headers yield `None`.
///
/// # Errors
///
/// Returns `TenancyError::InvalidFormat` for non-UTF-8 or non-UUID values.
pub fn header_id<B, T>(req: &Request<B>, header_name: &str) -> Result<Option<T>, TenancyError>
where
    T: FromStr,
{
    let Some(header_value) = req.headers().get(header_name) else {
        return Ok(None);
    };

    let value_str = header_value
        .to_str()
        .map_err(|_| TenancyError::InvalidFormat {
            header: header_name.to_string(),
            message: "Header value is not valid UTF-8".to_string(),
        })?;

    let trimmed = value_str.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| TenancyError::InvalidFormat {
            header: header_name.to_string(),
            message: format!("'{trimmed}' is not a valid UUID"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "550e8400-e29b-41d4-a716-446655440000";
    const ENV: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
    const ORG: &str = "6ba7b811-9dad-11d1-80b4-00c04fd430c8";

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_extract_full_triple() {
        let req = request(&[
            ("X-App-ID", APP),
            ("X-Environment-ID", ENV),
            ("X-Organization-ID", ORG),
        ]);
        let ctx = extract_tenancy(&req, &TenancyConfig::default()).unwrap();
        assert_eq!(ctx.app_id().to_string(), APP);
        assert_eq!(ctx.environment_id().unwrap().to_string(), ENV);
        assert_eq!(ctx.organization_id().unwrap().to_string(), ORG);
    }

    #[test]
    fn test_extract_app_only() {
        let req = request(&[("X-App-ID", APP)]);
        let ctx = extract_tenancy(&req, &TenancyConfig::default()).unwrap();
        assert!(ctx.environment_id().is_none());
        assert!(ctx.organization_id().is_none());
    }

    #[test]
    fn test_extract_with_whitespace() {
        let req = request(&[("X-App-ID", &format!("  {APP}  "))]);
        let ctx = extract_tenancy(&req, &TenancyConfig::default()).unwrap();
        assert_eq!(ctx.app_id().to_string(), APP);
    }

    #[test]
    fn test_missing_app() {
        let req = request(&[("X-Environment-ID", ENV)]);
        let result = extract_tenancy(&req, &TenancyConfig::default());
        assert_eq!(result, Err(TenancyError::AppMissing));
    }

    #[test]
    fn test_blank_app_is_missing() {
        let req = request(&[("X-App-ID", "   ")]);
        let result = extract_tenancy(&req, &TenancyConfig::default());
        assert_eq!(result, Err(TenancyError::AppMissing));
    }

    #[test]
    fn test_nil_app_is_missing() {
        let req = request(&[("X-App-ID", "00000000-0000-0000-0000-000000000000")]);
        let result = extract_tenancy(&req, &TenancyConfig::default());
        assert_eq!(result, Err(TenancyError::AppMissing));
    }

    #[test]
    fn test_invalid_environment() {
        let req = request(&[("X-App-ID", APP), ("X-Environment-ID", "staging")]);
        let result = extract_tenancy(&req, &TenancyConfig::default());
        assert!(matches!(
            result,
            Err(TenancyError::InvalidFormat { ref header, .. }) if header == "X-Environment-ID"
        ));
    }

    #[test]
    fn test_custom_header_names() {
        let req = request(&[("X-Client-App", APP)]);
        let config = TenancyConfig::builder().app_header("X-Client-App").build();
        assert!(extract_tenancy(&req, &config).is_ok());
    }

    #[test]
    fn test_extension_wins_over_headers() {
        let preset = TenancyContext::new(AppId::new());
        let mut req = request(&[("X-App-ID", APP)]);
        req.extensions_mut().insert(preset);

        let ctx = extract_tenancy(&req, &TenancyConfig::default()).unwrap();
        assert_eq!(ctx, preset);
    }
}
