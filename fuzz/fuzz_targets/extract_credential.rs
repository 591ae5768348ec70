#![no_main]

// Harness: arbitrary header/query input must never panic and must never
// produce a principal without a valid signature.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use clusterauth_core::identity::{CredentialSource, IdentityConfig, IdentityExtractor};

#[derive(Arbitrary, Debug)]
struct CredentialFrame {
    authorization: Option<String>,
    query: Vec<(String, String)>,
}

fuzz_target!(|frame: CredentialFrame| {
    let extractor = match IdentityExtractor::new(IdentityConfig::new("fuzz-secret")) {
        Ok(extractor) => extractor,
        Err(_) => return,
    };
    let source = CredentialSource {
        authorization: frame.authorization,
        query: frame.query,
    };
    if let Ok(principal) = extractor.extract(&source) {
        // Only a correctly signed token can get here, which the fuzzer cannot forge.
        panic!("forged credential accepted: {:?}", principal);
    }
});
