#![no_main]
use libfuzzer_sys::fuzz_target;
use vercel_deploy_core::vercel::parse_deployment_url;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(url) = parse_deployment_url(s) {
            // A parsed URL is always a single non-empty line
            assert!(!url.is_empty());
            assert!(!url.contains('\n'));
            assert!(s.contains(url.as_str()));
        }
    }
});
