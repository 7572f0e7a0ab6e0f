//! Key derivation command handler.

use anyhow::Result;

use rescache::CacheKey;

/// Handle `rescache key <ATTR>...`.
pub(crate) fn cmd_key(attributes: &[String]) -> Result<()> {
    let key = CacheKey::derive(attributes);
    println!("{}", key);
    println!("short: {}", key.short());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_key_matches_library_derivation() {
        let attrs = vec![
            "tenant1".to_string(),
            "openai".to_string(),
            "text-embedding-ada-002".to_string(),
        ];
        assert!(cmd_key(&attrs).is_ok());
        assert_eq!(
            CacheKey::derive(&attrs),
            CacheKey::derive(["tenant1", "openai", "text-embedding-ada-002"])
        );
    }
}
