//! 비밀번호 해싱 속성 테스트
//!
//! Argon2 해싱은 느리므로 케이스 수를 작게 잡습니다.

use gatehouse_api::auth::{hash_password, verify_password, HashedSecret};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn hash_then_verify_accepts_original(password in ".{0,48}") {
        let hash = hash_password(&password).unwrap();
        prop_assert!(verify_password(&hash, &password));
    }

    #[test]
    fn distinct_password_is_rejected(
        (original, other) in (".{1,32}", ".{1,32}").prop_filter("must differ", |(a, b)| a != b)
    ) {
        let hash = hash_password(&original).unwrap();
        prop_assert!(!verify_password(&hash, &other));
    }

    #[test]
    fn salts_make_hashes_distinct(password in "[a-zA-Z0-9]{8,24}") {
        let first = hash_password(&password).unwrap();
        let second = hash_password(&password).unwrap();
        prop_assert_ne!(first.as_str(), second.as_str());
        prop_assert!(verify_password(&first, &password));
        prop_assert!(verify_password(&second, &password));
    }
}

#[test]
fn malformed_stored_hash_never_verifies() {
    for stored in ["", "plaintext", "$argon2id$v=19$broken"] {
        assert!(!verify_password(&HashedSecret::from_phc(stored), "plaintext"));
    }
}
