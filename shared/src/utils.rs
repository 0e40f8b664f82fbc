use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// Special characters accepted (and required) in passwords
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// A wrapper type for sensitive data (passwords, tokens, secrets) that prevents accidental logging
///
/// This type implements Debug and Display to show only "[REDACTED]" to prevent
/// sensitive data from being logged or printed.
#[derive(Clone)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(s: String) -> Self {
        Self { inner: s }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl AsRef<str> for SecureString {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

// Request bodies carry passwords, so deserialization must work while Debug
// output stays redacted.
impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

/// Creates a truncated, salted hash of an identifier for safe logging.
///
/// # Arguments
/// * `id` - The identifier to hash (e.g., username, user_id).
/// * `salt` - A salt value from the application's configuration.
///
/// # Returns
/// A short, hexadecimal string representing the salted hash.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    // Take first 4 bytes and format each as hex
    hash[..4]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

/// Validates username format and length requirements.
///
/// # Username Requirements
/// - Minimum length: 3 characters
/// - Maximum length: 20 characters
/// - Allowed characters: alphanumeric (a-z, A-Z, 0-9) and underscore (_)
///
/// # Returns
/// - `Ok(())` if username meets all requirements
/// - `Err(String)` with user-friendly error message if validation fails
pub fn validate_username(username: &str) -> Result<(), String> {
    // 1. Check minimum length
    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    // 2. Check maximum length
    if username.len() > 20 {
        return Err("Username must not exceed 20 characters".to_string());
    }

    // 3. Check that all characters are alphanumeric or underscore
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validates email format: `local@domain.tld`.
///
/// Local part allows alphanumerics and `._%+-`; the domain allows
/// alphanumerics, dots and hyphens and must end in an alphabetic TLD of at
/// least two characters. Deliberately stricter than RFC 5321 - this mirrors
/// what the registration form accepts.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email must not be empty".to_string());
    }

    if email.len() > 100 {
        return Err("Email must not exceed 100 characters".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Email must contain an '@'".to_string());
    };

    if local.is_empty() {
        return Err("Email is missing the part before '@'".to_string());
    }

    if domain.contains('@') {
        return Err("Email must contain exactly one '@'".to_string());
    }

    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return Err("Email contains invalid characters before '@'".to_string());
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err("Email domain must contain a dot".to_string());
    };

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err("Email domain contains invalid characters".to_string());
    }

    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("Email domain must end in a valid top-level domain".to_string());
    }

    Ok(())
}

/// Validates password complexity requirements.
///
/// # Password Requirements
/// - Minimum length: 8 characters
/// - At least one uppercase letter (A-Z)
/// - At least one lowercase letter (a-z)
/// - At least one digit (0-9)
/// - At least one special character from `!@#$%^&*()_+-=[]{}|;:,.<>?`
///
/// # Returns
/// - `Ok(())` if password meets all requirements
/// - `Err(String)` with user-friendly error message if validation fails
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    // 1. Check minimum length
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    // 2. Check maximum length to bound bcrypt input
    if password.len() > 128 {
        return Err("Password must not exceed 128 characters".to_string());
    }

    // 3. Check for at least one uppercase letter
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    // 4. Check for at least one lowercase letter
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    // 5. Check for at least one digit
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    // 6. Check for at least one special character
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(format!(
            "Password must contain at least one special character ({})",
            PASSWORD_SPECIAL_CHARS
        ));
    }

    Ok(())
}

/// Validates secret key strength by checking entropy and patterns.
///
/// Checks for:
/// - Minimum length (must be at least min_length)
/// - Not all the same character (e.g., "aaaaa...")
/// - Not a simple pattern (e.g., "abcdabcd...")
/// - At least some character diversity
///
/// # Arguments
/// * `secret` - The secret key to validate
/// * `min_length` - Minimum required length
///
/// # Returns
/// - `Ok(())` if secret meets strength requirements
/// - `Err(String)` with explanation if validation fails
pub fn validate_secret_strength(secret: &str, min_length: usize) -> Result<(), String> {
    // 1. Check minimum length
    if secret.len() < min_length {
        return Err(format!(
            "Secret must be at least {} characters long",
            min_length
        ));
    }

    // 2. Check that not all characters are the same
    if let Some(first) = secret.chars().next() {
        if secret.chars().all(|c| c == first) {
            return Err("Secret must not consist of a single repeated character".to_string());
        }
    }

    // 3. Check for simple repeating patterns (e.g., "ababab" or "123123")
    if secret.len() >= 4 {
        for pattern_len in 2..=(secret.len() / 2).min(8) {
            let pattern = &secret[..pattern_len];
            let repetitions = secret.len() / pattern_len;
            let repeated = pattern.repeat(repetitions);
            if secret.starts_with(&repeated) {
                return Err("Secret must not contain simple repeating patterns".to_string());
            }
        }
    }

    // 4. Check character diversity - at least 8 unique characters for secrets >= 32 bytes
    if secret.len() >= 32 {
        let unique_chars: HashSet<char> = secret.chars().collect();
        if unique_chars.len() < 8 {
            return Err("Secret must contain at least 8 different characters".to_string());
        }
    }

    Ok(())
}

/// Adds security headers to HTTP responses
///
/// This function adds standard security headers to protect against:
/// - Clickjacking (X-Frame-Options)
/// - MIME sniffing (X-Content-Type-Options)
/// - XSS attacks (Content-Security-Policy, X-XSS-Protection)
/// - Man-in-the-middle attacks (Strict-Transport-Security, if HTTPS)
/// - Information leakage (Referrer-Policy)
/// - Unwanted browser features (Permissions-Policy)
///
/// # Arguments
/// * `headers` - Mutable reference to response headers
/// * `is_https` - Whether the connection is HTTPS (affects HSTS header)
pub fn add_security_headers(headers: &mut axum::http::HeaderMap, is_https: bool) {
    use axum::http::HeaderValue;

    // 1. X-Frame-Options: Prevent clickjacking by disabling iframe embedding
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    // 2. X-Content-Type-Options: Prevent MIME type sniffing
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );

    // 3. Content-Security-Policy: for a JSON API nothing should execute
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'self'; script-src 'none'; object-src 'none';"),
    );

    // 4. X-XSS-Protection: Legacy XSS protection (for older browsers)
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));

    // 5. Referrer-Policy: Control referrer information leakage
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // 6. Permissions-Policy: Disable unnecessary browser features
    headers.insert("Permissions-Policy", HeaderValue::from_static("geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()"));

    // 7. Strict-Transport-Security (HSTS): only meaningful over HTTPS
    if is_https {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        );
    }
}

/// Extracts client IP address from HTTP request headers
///
/// Checks headers in order of priority:
/// 1. X-Forwarded-For (first IP in the chain, if present)
/// 2. X-Real-IP (single IP, if present)
/// 3. Falls back to provided direct IP (from connection)
///
/// # Security Note
/// X-Forwarded-For can be spoofed by clients, so it should only be trusted
/// if the request comes through a trusted proxy/load balancer. In production,
/// ensure your reverse proxy sets these headers and strips any existing
/// X-Forwarded-For from untrusted sources.
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP (fallback if headers don't contain IP)
///
/// # Returns
/// IP address as a string (normalized, without brackets for IPv6)
pub fn extract_client_ip(headers: &axum::http::HeaderMap, direct_ip: Option<IpAddr>) -> String {
    // 1. Check X-Forwarded-For (first IP in chain)
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // X-Forwarded-For can contain multiple IPs: "client, proxy1, proxy2"
            // We want the first (original client) IP
            let first_ip = forwarded_str.split(',').next().unwrap_or("").trim();
            if !first_ip.is_empty() {
                if let Ok(ip) = first_ip.parse::<IpAddr>() {
                    return normalize_ip(ip);
                }
            }
        }
    }

    // 2. Check X-Real-IP (single IP, often set by nginx)
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            if let Ok(ip) = real_ip_str.trim().parse::<IpAddr>() {
                return normalize_ip(ip);
            }
        }
    }

    // 3. Fallback to direct connection IP
    if let Some(ip) = direct_ip {
        return normalize_ip(ip);
    }

    // 4. Last resort: return "unknown" (shouldn't happen in production)
    "unknown".to_string()
}

/// Normalizes IP address to string format (removes brackets for IPv6)
fn normalize_ip(ip: IpAddr) -> String {
    let ip_str = ip.to_string();
    ip_str
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}
