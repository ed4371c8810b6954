//! Default campaign stages created with every new reporting cycle.

/// Stage titles in campaign order.
pub const DEFAULT_STAGE_TITLES: &[&str] = &["Invitations", "Reminder", "Deadline", "After"];

/// Maximum length of a stage title (matches the `stages.title` column).
pub const MAX_STAGE_TITLE_LENGTH: usize = 64;

/// Validate a stage title: non-empty after trimming and within the column limit.
pub fn validate_stage_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Stage title must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_STAGE_TITLE_LENGTH {
        return Err(format!(
            "Stage title exceeds maximum length of {MAX_STAGE_TITLE_LENGTH} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stages_in_campaign_order() {
        assert_eq!(DEFAULT_STAGE_TITLES, &["Invitations", "Reminder", "Deadline", "After"]);
    }

    #[test]
    fn blank_title_rejected() {
        assert!(validate_stage_title("   ").is_err());
    }

    #[test]
    fn long_title_rejected() {
        let title = "x".repeat(MAX_STAGE_TITLE_LENGTH + 1);
        assert!(validate_stage_title(&title).unwrap_err().contains("maximum length"));
    }

    #[test]
    fn normal_title_accepted() {
        assert!(validate_stage_title("Second reminder").is_ok());
    }
}
