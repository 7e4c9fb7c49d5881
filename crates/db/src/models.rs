//! Stored document types.

use serde::{Deserialize, Serialize};

/// Profile document, one per auth account.
///
/// Serialized as-is into the `document` column and into HTTP responses.
/// `profilePicture` is always present (`null` when no image was uploaded);
/// the free-form fields are omitted when never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_null_picture_and_skips_missing_fields() {
        let profile = Profile {
            uid: "u1".into(),
            name: Some("Ann".into()),
            gender: None,
            lifestyle: None,
            profile_picture: None,
        };

        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({ "uid": "u1", "name": "Ann", "profilePicture": null })
        );
    }

    #[test]
    fn deserializes_documents_without_optional_keys() {
        let profile: Profile = serde_json::from_value(json!({ "uid": "u2" })).unwrap();
        assert_eq!(profile.uid, "u2");
        assert!(profile.name.is_none());
        assert!(profile.profile_picture.is_none());
    }
}
