//! Field rules shared by the request types

use validator::ValidationError;

use crate::error::{ApiError, ApiResult};

/// Longest accepted tag
pub const MAX_TAG_LEN: usize = 50;

/// Most tags on one task
pub const MAX_TAGS: usize = 20;

/// `#RRGGBB`
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("color");
        err.message = Some("Color must be in #RRGGBB format".into());
        Err(err)
    }
}

/// Color check for update bodies, where `null` clears the color
pub fn check_color(color: Option<&Option<String>>) -> ApiResult<()> {
    match color {
        Some(Some(value)) => validate_color(value)
            .map_err(|_| ApiError::invalid_field("color", "Color must be in #RRGGBB format")),
        _ => Ok(()),
    }
}

/// Trims tags and drops duplicates, rejecting blank, oversized or
/// comma-containing entries (a comma could never be matched by the tag filter)
pub fn normalize_tags(tags: Vec<String>) -> ApiResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());

    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN || tag.contains(',') {
            return Err(ApiError::invalid_field(
                "tags",
                format!("Tags must be 1-{} characters without commas", MAX_TAG_LEN),
            ));
        }
        if !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }

    if normalized.len() > MAX_TAGS {
        return Err(ApiError::invalid_field(
            "tags",
            format!("At most {} tags per task", MAX_TAGS),
        ));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#3366ff").is_ok());
        assert!(validate_color("#ABCDEF").is_ok());
        assert!(validate_color("3366ff").is_err());
        assert!(validate_color("#3366f").is_err());
        assert!(validate_color("#33660g").is_err());
    }

    #[test]
    fn test_check_color_allows_clearing() {
        assert!(check_color(None).is_ok());
        assert!(check_color(Some(&None)).is_ok());
        assert!(check_color(Some(&Some("#000000".to_string()))).is_ok());
        assert!(check_color(Some(&Some("red".to_string()))).is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![" work ".to_string(), "urgent".to_string(), "work".to_string()];
        assert_eq!(normalize_tags(tags).unwrap(), vec!["work", "urgent"]);

        assert!(normalize_tags(vec!["a,b".to_string()]).is_err());
        assert!(normalize_tags(vec!["  ".to_string()]).is_err());
        assert!(normalize_tags(vec!["x".repeat(MAX_TAG_LEN + 1)]).is_err());
    }

    #[test]
    fn test_tag_length_counts_characters() {
        let accented = "é".repeat(MAX_TAG_LEN);
        assert_eq!(normalize_tags(vec![accented.clone()]).unwrap(), vec![accented]);

        assert!(normalize_tags(vec!["é".repeat(MAX_TAG_LEN + 1)]).is_err());
    }
}
