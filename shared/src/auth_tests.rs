use super::*;

const TEST_SECRET: &str = "unit-test-signing-secret-0123456789-abcdef";

fn test_manager() -> AuthManager {
    AuthManager::from_parts(TEST_SECRET, 30, 7).unwrap()
}

#[test]
fn test_issue_and_verify_access_token() {
    let manager = test_manager();
    let token = manager.issue_token("alice", TokenKind::Access).unwrap();

    let claims = manager.verify_token(&token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.kind, TokenKind::Access);
    assert!(claims.exp > claims.iat);
    assert!(claims.iat <= Utc::now().timestamp());
}

#[test]
fn test_issue_pair_returns_distinct_kinds() {
    let manager = test_manager();
    let (access, refresh) = manager.issue_pair("bob").unwrap();
    assert_ne!(access, refresh);

    let access_claims = manager.verify_token(&access).unwrap();
    let refresh_claims = manager.verify_token(&refresh).unwrap();
    assert_eq!(access_claims.kind, TokenKind::Access);
    assert_eq!(refresh_claims.kind, TokenKind::Refresh);
    assert_eq!(access_claims.sub, "bob");
    assert_eq!(refresh_claims.sub, "bob");
}

#[test]
fn test_refresh_token_outlives_access_token() {
    let manager = test_manager();
    let (access, refresh) = manager.issue_pair("carol").unwrap();

    let access_claims = manager.verify_token(&access).unwrap();
    let refresh_claims = manager.verify_token(&refresh).unwrap();
    assert!(refresh_claims.exp > access_claims.exp);
}

#[test]
fn test_empty_secret_rejected() {
    assert!(AuthManager::from_parts("", 30, 7).is_err());
    assert!(AuthManager::from_parts("   ", 30, 7).is_err());
}

#[test]
fn test_non_positive_lifetimes_rejected() {
    assert!(AuthManager::from_parts(TEST_SECRET, 0, 7).is_err());
    assert!(AuthManager::from_parts(TEST_SECRET, -5, 7).is_err());
    assert!(AuthManager::from_parts(TEST_SECRET, 30, 0).is_err());
    assert!(AuthManager::from_parts(TEST_SECRET, 30, -1).is_err());
}

#[test]
fn test_kind_mismatch_rejected() {
    let manager = test_manager();
    let (access, refresh) = manager.issue_pair("dave").unwrap();

    assert!(manager.verify_token_of_kind(&access, TokenKind::Access).is_ok());
    assert!(manager.verify_token_of_kind(&refresh, TokenKind::Refresh).is_ok());

    let err = manager
        .verify_token_of_kind(&refresh, TokenKind::Access)
        .unwrap_err();
    assert!(err.to_string().contains("access"));

    assert!(manager
        .verify_token_of_kind(&access, TokenKind::Refresh)
        .is_err());
}

#[test]
fn test_tampered_token_rejected() {
    let manager = test_manager();
    let mut token = manager.issue_token("eve", TokenKind::Access).unwrap();

    // Flip the last signature character
    let last = token.pop().unwrap();
    token.push(if last == 'A' { 'B' } else { 'A' });

    assert!(manager.verify_token(&token).is_err());
}

#[test]
fn test_malformed_token_rejected() {
    let manager = test_manager();
    assert!(manager.verify_token("").is_err());
    assert!(manager.verify_token("not-a-jwt").is_err());
    assert!(manager.verify_token("aaa.bbb.ccc").is_err());
}

#[test]
fn test_wrong_secret_rejected() {
    let manager = test_manager();
    let other = AuthManager::from_parts("a-completely-different-secret-value", 30, 7).unwrap();

    let token = manager.issue_token("frank", TokenKind::Access).unwrap();
    assert!(other.verify_token(&token).is_err());
}

#[test]
fn test_expired_token_fails_consistently() {
    let manager = test_manager();
    let token = manager
        .issue_token_with_lifetime("grace", TokenKind::Access, Duration::seconds(-120))
        .unwrap();

    let first = manager.verify_token(&token).unwrap_err().to_string();
    let second = manager.verify_token(&token).unwrap_err().to_string();
    assert_eq!(first, second);
    assert!(first.contains("Invalid or expired token"));
}
