use crate::identity::ClientIdentity;

/// Counter key for an identity: `"<class>:<id>"`.
pub fn rate_limit_key(identity: &ClientIdentity) -> String {
    format!("{}:{}", identity.class.as_str(), identity.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_by_class() {
        let anonymous = ClientIdentity::anonymous("1.2.3.4");
        let authenticated = ClientIdentity::authenticated("1.2.3.4");

        assert_eq!(rate_limit_key(&anonymous), "ip:1.2.3.4");
        assert_eq!(rate_limit_key(&authenticated), "api_key:1.2.3.4");
    }
}
