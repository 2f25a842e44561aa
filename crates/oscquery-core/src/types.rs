//! Value type to OSC type-tag lookup

use std::any::{type_name, TypeId};

fn type_tags() -> [(TypeId, &'static str); 10] {
    [
        (TypeId::of::<i32>(), "i"),
        (TypeId::of::<u32>(), "u"),
        (TypeId::of::<i64>(), "h"),
        (TypeId::of::<f32>(), "f"),
        (TypeId::of::<f64>(), "d"),
        (TypeId::of::<String>(), "s"),
        (TypeId::of::<&'static str>(), "s"),
        (TypeId::of::<char>(), "c"),
        (TypeId::of::<Vec<u8>>(), "b"),
        (TypeId::of::<bool>(), "T"),
    ]
}

/// OSC type tag for `T`, or `None` if the type has no OSC representation
pub fn osc_type_tag<T: ?Sized + 'static>() -> Option<&'static str> {
    let id = TypeId::of::<T>();
    type_tags()
        .iter()
        .find(|(ty, _)| *ty == id)
        .map(|(_, tag)| *tag)
}

/// Like [`osc_type_tag`], with an error naming the rejected type
pub fn require_osc_type_tag<T: ?Sized + 'static>() -> crate::Result<&'static str> {
    osc_type_tag::<T>().ok_or_else(|| crate::Error::UnsupportedType(type_name::<T>().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert_eq!(osc_type_tag::<i32>(), Some("i"));
        assert_eq!(osc_type_tag::<f32>(), Some("f"));
        assert_eq!(osc_type_tag::<String>(), Some("s"));
        assert_eq!(osc_type_tag::<&str>(), Some("s"));
        assert_eq!(osc_type_tag::<bool>(), Some("T"));
        assert_eq!(osc_type_tag::<Vec<u8>>(), Some("b"));
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(osc_type_tag::<u8>(), None);
        let err = require_osc_type_tag::<std::net::IpAddr>().unwrap_err();
        assert!(err.to_string().contains("IpAddr"));
    }
}
