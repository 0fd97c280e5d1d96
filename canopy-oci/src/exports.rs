//! Keys under which a deployment exports identifiers

pub const VCN_ID: &str = "vcn_id";
pub const BUCKET_NAME: &str = "bucket_name";
pub const COMPARTMENT_ID: &str = "compartment_id";

/// Positional key, e.g. `instance-3`
pub fn export_key(prefix: &str, index: usize) -> String {
    format!("{}-{}", prefix, index)
}

/// Name-based key, e.g. `subnet:public-subnet`
pub fn named_key(prefix: &str, name: &str) -> String {
    format!("{}:{}", prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_keys_use_decimal_index() {
        assert_eq!(export_key("instance", 0), "instance-0");
        assert_eq!(export_key("instance", 12), "instance-12");
        assert_eq!(export_key("subnet", 65), "subnet-65");
    }

    #[test]
    fn named_keys() {
        assert_eq!(named_key("subnet", "public-subnet"), "subnet:public-subnet");
    }
}
