use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    // Standard Chromium error
    let err = NetError::ConnectionRefused;
    let code = err.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Crate-specific error
    let custom = NetError::FetchUnavailable;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -10001);
    assert!(matches!(NetError::from(custom_code), NetError::FetchUnavailable));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_context_variants_share_chromium_codes() {
    let dns = NetError::dns_failed("example.com", "NXDOMAIN");
    assert_eq!(dns.as_i32(), NetError::NameNotResolved.as_i32());
    assert!(dns.is_dns_error());

    let conn = NetError::connection_failed_to("example.com", 443, "reset");
    assert_eq!(conn.as_i32(), NetError::ConnectionFailed.as_i32());
    assert!(!conn.is_dns_error());
}

#[test]
fn test_display_carries_context() {
    let err = NetError::dns_failed("example.com", "no records");
    assert_eq!(err.to_string(), "Name example.com not resolved: no records");
}

#[test]
fn test_every_crate_code_maps_back_to_its_variant() {
    let errors = [
        NetError::FetchUnavailable,
        NetError::InvalidConfiguration("bad order".to_string()),
        NetError::RuntimeUnsupported("global dispatcher"),
        NetError::HttpBodyError,
    ];
    for err in errors {
        let back = NetError::from(err.as_i32());
        assert_eq!(std::mem::discriminant(&back), std::mem::discriminant(&err), "{err:?}");
        assert_eq!(back.as_i32(), err.as_i32());
    }
}
