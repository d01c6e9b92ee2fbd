use super::app_error::AppError;

pub(super) fn map_database_error(
    code: Option<&str>,
    constraint: Option<&str>,
    message: &str,
) -> Option<AppError> {
    match code {
        Some("23505") => Some(AppError::Conflict(
            conflict_message_from_constraint(constraint).to_string(),
        )),
        Some("23502") => Some(AppError::validation_error(
            required_field_message_from_db(message)
                .unwrap_or_else(|| "required field is missing".to_string()),
        )),
        Some("23503") => Some(AppError::NotFound(
            foreign_key_message_from_constraint(constraint).to_string(),
        )),
        Some("23514") => Some(AppError::validation_error(
            check_message_from_constraint(constraint),
        )),
        Some("22P02") => Some(AppError::validation_error("invalid input format")),
        Some("08001") | Some("08006") => Some(AppError::database_unavailable(
            "Unable to connect to database. Please try again later.",
        )),
        Some("53300") | Some("57P01") => Some(AppError::database_unavailable(
            "Service temporarily unavailable. Please try again later.",
        )),
        Some("57014") => Some(AppError::Timeout {
            operation: "database statement",
        }),
        _ => None,
    }
}

pub(super) fn conflict_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("conversations_pair_listing_key") => {
            "conversation already exists for these participants"
        }
        Some("messages_pkey") => "message already exists",
        _ => "resource already exists",
    }
}

pub(super) fn foreign_key_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("messages_conversation_id_fkey") => "conversation not found",
        _ => "referenced resource does not exist",
    }
}

pub(super) fn check_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("conversations_distinct_participants") => {
            "a user cannot start a conversation with themselves"
        }
        Some("conversations_participants_ordered") => "participants must be stored in order",
        Some("messages_content_not_blank") => "content must not be empty",
        _ => "request violates validation rules",
    }
}

pub(super) fn required_field_message_from_db(message: &str) -> Option<String> {
    let marker = "column \"";
    let start = message.find(marker)?;
    let rest = &message[start + marker.len()..];
    let end = rest.find('"')?;
    let field = &rest[..end];
    Some(format!("{field} is required"))
}
