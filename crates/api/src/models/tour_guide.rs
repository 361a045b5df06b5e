//! Tour guide profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripmart_core::{Email, Nationality, PhoneNumber, Principal, TourGuideId, Username};

use super::{ValidationError, text_list};
use crate::services::guard::Owned;

/// Upper bound on `yearsOfExperience`.
pub const MAX_YEARS_OF_EXPERIENCE: u8 = 80;
const MAX_PREVIOUS_WORKS: usize = 50;
const MAX_PREVIOUS_WORK_LENGTH: usize = 500;

/// A tour guide profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourGuide {
    pub id: TourGuideId,
    pub email: Email,
    pub username: Username,
    pub nationality: Nationality,
    pub mobile: Option<PhoneNumber>,
    pub years_of_experience: u8,
    pub previous_works: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for TourGuide {
    const KIND: &'static str = "tour guide";

    /// A profile is owned by the guide it describes.
    fn owner(&self) -> Principal {
        self.id.into()
    }
}

fn check_experience(years: u8) -> Result<u8, ValidationError> {
    if years > MAX_YEARS_OF_EXPERIENCE {
        return Err(ValidationError::new(
            "yearsOfExperience",
            format!("must be at most {MAX_YEARS_OF_EXPERIENCE}"),
        ));
    }
    Ok(years)
}

/// Body of `POST /tour-guides`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTourGuide {
    pub email: Email,
    pub username: Username,
    pub nationality: Nationality,
    #[serde(default)]
    pub mobile: Option<PhoneNumber>,
    #[serde(default)]
    pub years_of_experience: u8,
    #[serde(default)]
    pub previous_works: Vec<String>,
}

impl NewTourGuide {
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            years_of_experience: check_experience(self.years_of_experience)?,
            previous_works: text_list(
                "previousWorks",
                self.previous_works,
                MAX_PREVIOUS_WORKS,
                MAX_PREVIOUS_WORK_LENGTH,
            )?,
            ..self
        })
    }
}

/// Body of `PUT /tour-guides/{id}`. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TourGuideUpdate {
    pub email: Option<Email>,
    pub username: Option<Username>,
    pub nationality: Option<Nationality>,
    pub mobile: Option<PhoneNumber>,
    pub years_of_experience: Option<u8>,
    pub previous_works: Option<Vec<String>>,
}

impl TourGuideUpdate {
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            years_of_experience: self
                .years_of_experience
                .map(check_experience)
                .transpose()?,
            previous_works: self
                .previous_works
                .map(|works| {
                    text_list(
                        "previousWorks",
                        works,
                        MAX_PREVIOUS_WORKS,
                        MAX_PREVIOUS_WORK_LENGTH,
                    )
                })
                .transpose()?,
            ..self
        })
    }

    pub fn apply_to(self, guide: &mut TourGuide) {
        if let Some(email) = self.email {
            guide.email = email;
        }
        if let Some(username) = self.username {
            guide.username = username;
        }
        if let Some(nationality) = self.nationality {
            guide.nationality = nationality;
        }
        if let Some(mobile) = self.mobile {
            guide.mobile = Some(mobile);
        }
        if let Some(years) = self.years_of_experience {
            guide.years_of_experience = years;
        }
        if let Some(works) = self.previous_works {
            guide.previous_works = works;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn guide() -> TourGuide {
        let now = Utc::now();
        TourGuide {
            id: TourGuideId::new(4),
            email: Email::parse("amira@tours.example").unwrap(),
            username: Username::parse("amira").unwrap(),
            nationality: Nationality::parse("EG").unwrap(),
            mobile: None,
            years_of_experience: 6,
            previous_works: vec!["Luxor day trips".into()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_tour_guide_validation() {
        let json = r#"{"email":"Amira@Tours.example","username":"amira","nationality":"eg"}"#;
        let input: NewTourGuide = serde_json::from_str(json).unwrap();
        let input = input.validated().unwrap();
        assert_eq!(input.email.as_str(), "amira@tours.example");
        assert_eq!(input.nationality.as_str(), "EG");
        assert!(input.previous_works.is_empty());

        let json = r#"{"email":"a@b.example","username":"amira","nationality":"EG","yearsOfExperience":81}"#;
        let input: NewTourGuide = serde_json::from_str(json).unwrap();
        assert_eq!(input.validated().unwrap_err().field, "yearsOfExperience");
    }

    #[test]
    fn test_new_tour_guide_rejects_bad_formats() {
        for json in [
            r#"{"email":"nope","username":"amira","nationality":"EG"}"#,
            r#"{"email":"a@b.example","username":"a b","nationality":"EG"}"#,
            r#"{"email":"a@b.example","username":"amira","nationality":"Egypt"}"#,
            r#"{"email":"a@b.example","username":"amira","nationality":"EG","role":"admin"}"#,
        ] {
            assert!(serde_json::from_str::<NewTourGuide>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut g = guide();
        let update: TourGuideUpdate =
            serde_json::from_str(r#"{"yearsOfExperience":7,"previousWorks":[" Aswan ",""]}"#)
                .unwrap();
        update.validated().unwrap().apply_to(&mut g);

        assert_eq!(g.years_of_experience, 7);
        assert_eq!(g.previous_works, vec!["Aswan".to_owned()]);
        assert_eq!(g.username.as_str(), "amira");
    }

    #[test]
    fn test_profile_is_owned_by_its_guide() {
        assert_eq!(guide().owner(), Principal::from(TourGuideId::new(4)));
    }
}
