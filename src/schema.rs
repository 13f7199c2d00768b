use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::CustomField;

/// Extended data schema types understood by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaType {
    Text,
    Long,
    Enum,
    #[serde(rename = "multi-enum")]
    MultiEnum,
    Boolean,
    YoutubeVideoUrl,
}

/// The input widget a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    MultilineText,
    Integer,
    Select,
    CheckboxGroup,
    YesNo,
    Url,
}

impl SchemaType {
    pub const fn input_kind(self) -> InputKind {
        match self {
            Self::Text => InputKind::MultilineText,
            Self::Long => InputKind::Integer,
            Self::Enum => InputKind::Select,
            Self::MultiEnum => InputKind::CheckboxGroup,
            Self::Boolean => InputKind::YesNo,
            Self::YoutubeVideoUrl => InputKind::Url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldValueError {
    #[error("{0}")]
    Required(String),
    #[error("expected {expected}")]
    WrongType { expected: &'static str },
    #[error("'{0}' is not one of the allowed options")]
    UnknownOption(String),
    #[error("value must be at least {0}")]
    TooSmall(i64),
    #[error("value must be at most {0}")]
    TooLarge(i64),
    #[error("not a YouTube video link")]
    NotYoutube,
}

const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn is_youtube_url(text: &str) -> bool {
    reqwest::Url::parse(text)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| YOUTUBE_HOSTS.contains(&host.as_str()))
}

/// Checks a form value against the field definition.
pub fn validate_field_value(
    field: CustomField<'_>,
    value: Option<&Value>,
) -> Result<(), FieldValueError> {
    if is_empty(value) {
        return match field.save_config() {
            Some(save) if save.is_required => Err(FieldValueError::Required(
                save.required_message
                    .clone()
                    .unwrap_or_else(|| "This field is required".to_string()),
            )),
            _ => Ok(()),
        };
    }
    let Some(value) = value else {
        return Ok(());
    };

    let has_option = |option: &str| field.enum_options().iter().any(|o| o.option == option);

    match field.schema_type() {
        SchemaType::Text => value
            .as_str()
            .map(|_| ())
            .ok_or(FieldValueError::WrongType { expected: "text" }),
        SchemaType::Long => {
            let number = value
                .as_i64()
                .ok_or(FieldValueError::WrongType { expected: "integer" })?;
            let (minimum, maximum) = field.bounds();
            match (minimum, maximum) {
                (Some(min), _) if number < min => Err(FieldValueError::TooSmall(min)),
                (_, Some(max)) if number > max => Err(FieldValueError::TooLarge(max)),
                _ => Ok(()),
            }
        }
        SchemaType::Enum => {
            let option = value
                .as_str()
                .ok_or(FieldValueError::WrongType { expected: "option" })?;
            if has_option(option) {
                Ok(())
            } else {
                Err(FieldValueError::UnknownOption(option.to_string()))
            }
        }
        SchemaType::MultiEnum => {
            let options = value
                .as_array()
                .ok_or(FieldValueError::WrongType { expected: "list of options" })?;
            for option in options {
                let option = option
                    .as_str()
                    .ok_or(FieldValueError::WrongType { expected: "list of options" })?;
                if !has_option(option) {
                    return Err(FieldValueError::UnknownOption(option.to_string()));
                }
            }
            Ok(())
        }
        SchemaType::Boolean => value
            .as_bool()
            .map(|_| ())
            .ok_or(FieldValueError::WrongType { expected: "yes or no" }),
        SchemaType::YoutubeVideoUrl => {
            let text = value
                .as_str()
                .ok_or(FieldValueError::WrongType { expected: "link" })?;
            if is_youtube_url(text) {
                Ok(())
            } else {
                Err(FieldValueError::NotYoutube)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EnumOption, FieldScope, ListingField, SaveConfig};
    use serde_json::json;

    fn field(schema_type: SchemaType) -> ListingField {
        ListingField {
            key: "size".to_string(),
            scope: FieldScope::Public,
            schema_type,
            enum_options: vec![
                EnumOption {
                    option: "s".to_string(),
                    label: None,
                },
                EnumOption {
                    option: "m".to_string(),
                    label: None,
                },
            ],
            category_config: None,
            listing_type_config: None,
            save_config: None,
            minimum: Some(1),
            maximum: Some(10),
        }
    }

    #[test]
    fn schema_type_names() {
        let parsed: SchemaType = serde_json::from_value(json!("multi-enum")).unwrap();
        assert_eq!(parsed, SchemaType::MultiEnum);
        let parsed: SchemaType = serde_json::from_value(json!("youtubeVideoUrl")).unwrap();
        assert_eq!(parsed.input_kind(), InputKind::Url);
        assert!(serde_json::from_value::<SchemaType>(json!("hologram")).is_err());
    }

    #[test]
    fn enum_values_must_be_known_options() {
        let enum_field = field(SchemaType::Enum);
        let custom = CustomField::Listing(&enum_field);
        assert!(validate_field_value(custom, Some(&json!("m"))).is_ok());
        assert_eq!(
            validate_field_value(custom, Some(&json!("xl"))),
            Err(FieldValueError::UnknownOption("xl".to_string()))
        );

        let multi = field(SchemaType::MultiEnum);
        let custom = CustomField::Listing(&multi);
        assert!(validate_field_value(custom, Some(&json!(["s", "m"]))).is_ok());
        assert!(validate_field_value(custom, Some(&json!(["s", "xl"]))).is_err());
    }

    #[test]
    fn long_bounds() {
        let long = field(SchemaType::Long);
        let custom = CustomField::Listing(&long);
        assert_eq!(
            validate_field_value(custom, Some(&json!(0))),
            Err(FieldValueError::TooSmall(1))
        );
        assert_eq!(
            validate_field_value(custom, Some(&json!(11))),
            Err(FieldValueError::TooLarge(10))
        );
        assert!(validate_field_value(custom, Some(&json!(5))).is_ok());
    }

    #[test]
    fn required_fields() {
        let mut text = field(SchemaType::Text);
        assert!(validate_field_value(CustomField::Listing(&text), None).is_ok());

        text.save_config = Some(SaveConfig {
            label: None,
            is_required: true,
            required_message: Some("Tell us more".to_string()),
        });
        assert_eq!(
            validate_field_value(CustomField::Listing(&text), Some(&json!("  "))),
            Err(FieldValueError::Required("Tell us more".to_string()))
        );
    }

    #[test]
    fn youtube_links() {
        let url = field(SchemaType::YoutubeVideoUrl);
        let custom = CustomField::Listing(&url);
        assert!(validate_field_value(custom, Some(&json!("https://youtu.be/abc"))).is_ok());
        assert_eq!(
            validate_field_value(custom, Some(&json!("https://vimeo.com/1"))),
            Err(FieldValueError::NotYoutube)
        );
    }
}
