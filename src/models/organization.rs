use isocountry::CountryCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::MIN_FOUNDED_YEAR;
use crate::models::validation::{
    blank_to_none, timestamp_to_rfc3339, validate_length, validate_url, validate_url_host,
};

/// Tour availability codes
pub const TOUR_UNKNOWN: u8 = 0;
pub const TOUR_AVAILABLE: u8 = 1;
pub const TOUR_UNAVAILABLE: u8 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    /// ISO 3166-1 alpha-2 code
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
    pub zip_code: String,
}

impl Location {
    fn normalize(&mut self) {
        self.country = self.country.trim().to_ascii_uppercase();
        self.state = self.state.trim().to_string();
        self.city = self.city.trim().to_string();
        self.address = self.address.trim().to_string();
        self.zip_code = self.zip_code.trim().to_string();
    }

    fn validate(&self) -> Result<(), String> {
        if CountryCode::for_alpha2(&self.country).is_err() {
            return Err(format!(
                "\"{}\" is not a valid ISO 3166-1 alpha-2 country code",
                self.country
            ));
        }
        validate_length("State", &self.state, 0, 50)?;
        validate_length("City", &self.city, 0, 50)?;
        validate_length("Address", &self.address, 0, 150)?;
        validate_length("Zip code", &self.zip_code, 0, 50)
    }
}

/// Every ISO 3166-1 country, alpha-2 code to English name
pub fn countries() -> BTreeMap<&'static str, &'static str> {
    CountryCode::iter()
        .map(|code| (code.alpha2(), code.name()))
        .collect()
}

/// Person representing an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representative {
    pub first_name: String,
    pub last_name: String,
}

/// Editable organization fields, shared by requests, storage and responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProfile {
    pub name: String,
    pub description: String,
    pub website: String,
    pub founded_in: i32,
    #[serde(default)]
    pub tour_availability: u8,
    pub location: Location,
    pub representative: Representative,
    pub image: Option<String>,
    pub phone_number: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub ecommerce: Option<String>,
}

impl OrganizationProfile {
    /// Trim text fields and turn blank optional fields into `None`
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.website = self.website.trim().to_string();
        self.representative.first_name = self.representative.first_name.trim().to_string();
        self.representative.last_name = self.representative.last_name.trim().to_string();
        self.location.normalize();
        self.image = blank_to_none(self.image.take());
        self.phone_number = blank_to_none(self.phone_number.take());
        self.twitter = blank_to_none(self.twitter.take());
        self.facebook = blank_to_none(self.facebook.take());
        self.instagram = blank_to_none(self.instagram.take());
        self.ecommerce = blank_to_none(self.ecommerce.take());
    }

    pub fn validate(&self, current_year: i32) -> Result<(), String> {
        validate_length("Name", &self.name, 1, 30)?;
        validate_length("Description", &self.description, 1, 300)?;
        validate_url("Website", &self.website)?;

        if self.founded_in < MIN_FOUNDED_YEAR || self.founded_in > current_year {
            return Err(format!(
                "Founded year must be between {} and {}",
                MIN_FOUNDED_YEAR, current_year
            ));
        }

        if self.tour_availability > TOUR_UNAVAILABLE {
            return Err(format!(
                "Tour availability must be {}, {} or {}",
                TOUR_UNKNOWN, TOUR_AVAILABLE, TOUR_UNAVAILABLE
            ));
        }

        self.location.validate()?;
        validate_length("First name", &self.representative.first_name, 1, 30)?;
        validate_length("Last name", &self.representative.last_name, 1, 30)?;

        if let Some(image) = &self.image {
            validate_url("Image", image)?;
        }
        if let Some(phone) = &self.phone_number {
            validate_length("Phone number", phone, 7, 17)?;
        }
        if let Some(twitter) = &self.twitter {
            validate_url_host("Twitter", twitter, "twitter.com")?;
        }
        if let Some(facebook) = &self.facebook {
            validate_url_host("Facebook", facebook, "facebook.com")?;
        }
        if let Some(instagram) = &self.instagram {
            validate_url_host("Instagram", instagram, "instagram.com")?;
        }
        if let Some(ecommerce) = &self.ecommerce {
            validate_url("Ecommerce", ecommerce)?;
        }

        Ok(())
    }

    /// Case-insensitive match on name, state or city
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        [&self.name, &self.location.state, &self.location.city]
            .iter()
            .any(|field| field.to_lowercase().contains(&keyword))
    }
}

/// Partial update of an organization; absent fields are left untouched,
/// blank optional fields clear the stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub founded_in: Option<i32>,
    pub tour_availability: Option<u8>,
    pub location: Option<Location>,
    pub representative: Option<Representative>,
    pub image: Option<String>,
    pub phone_number: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub ecommerce: Option<String>,
}

impl OrganizationPatch {
    pub fn apply(self, profile: &mut OrganizationProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(description) = self.description {
            profile.description = description;
        }
        if let Some(website) = self.website {
            profile.website = website;
        }
        if let Some(founded_in) = self.founded_in {
            profile.founded_in = founded_in;
        }
        if let Some(tour_availability) = self.tour_availability {
            profile.tour_availability = tour_availability;
        }
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(representative) = self.representative {
            profile.representative = representative;
        }
        if self.image.is_some() {
            profile.image = self.image;
        }
        if self.phone_number.is_some() {
            profile.phone_number = self.phone_number;
        }
        if self.twitter.is_some() {
            profile.twitter = self.twitter;
        }
        if self.facebook.is_some() {
            profile.facebook = self.facebook;
        }
        if self.instagram.is_some() {
            profile.instagram = self.instagram;
        }
        if self.ecommerce.is_some() {
            profile.ecommerce = self.ecommerce;
        }
    }
}

/// Organization record stored in redb, keyed by organization id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub owner_id: u64,
    pub profile: OrganizationProfile,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Organization model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: u64,
    pub owner_id: u64,
    #[serde(flatten)]
    pub profile: OrganizationProfile,
    pub created_at: String,
    pub updated_at: String,
}

impl Organization {
    pub fn from_record(id: u64, record: OrganizationRecord) -> Self {
        Self {
            id,
            owner_id: record.owner_id,
            profile: record.profile,
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
        }
    }
}

/// Organization as seen by a particular viewer
///
/// `is_favorited` and `rating` are `None` for anonymous viewers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub products: Vec<u64>,
    pub is_favorited: Option<bool>,
    pub rating: Option<u8>,
}

/// One page of the public organization listing
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationPage {
    pub count: usize,
    pub page: usize,
    pub results: Vec<Organization>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::profile;
    use super::*;

    const YEAR: i32 = 2024;

    #[test]
    fn test_valid_profile() {
        assert!(profile("Chebacca Inc.").validate(YEAR).is_ok());
    }

    #[test]
    fn test_founded_in_bounds() {
        let mut p = profile("Acme");
        p.founded_in = MIN_FOUNDED_YEAR;
        assert!(p.validate(YEAR).is_ok());

        p.founded_in = MIN_FOUNDED_YEAR - 1;
        assert!(p.validate(YEAR).is_err());

        p.founded_in = YEAR + 1;
        assert!(p.validate(YEAR).is_err());
    }

    #[test]
    fn test_country_must_be_iso_code() {
        let mut p = profile("Acme");
        for code in ["ZZ", "XX", "J", "JPN", "1A"] {
            p.location.country = code.to_string();
            assert!(p.validate(YEAR).is_err(), "{} accepted", code);
        }

        p.location.country = "DE".to_string();
        assert!(p.validate(YEAR).is_ok());
    }

    #[test]
    fn test_countries_lists_iso_codes() {
        let all = countries();
        assert_eq!(all.get("JP"), Some(&"Japan"));
        assert!(all.contains_key("DE"));
        assert!(!all.contains_key("ZZ"));
        assert!(all.len() > 240);
    }

    #[test]
    fn test_tour_availability_range() {
        let mut p = profile("Acme");
        p.tour_availability = 3;
        assert!(p.validate(YEAR).is_err());
    }

    #[test]
    fn test_social_links_require_matching_host() {
        let mut p = profile("Acme");
        p.instagram = Some("https://example.com/acme".to_string());
        let err = p.validate(YEAR).unwrap_err();
        assert!(err.contains("instagram.com"));

        p.instagram = Some("https://instagram.com.evil.example/acme".to_string());
        assert!(p.validate(YEAR).is_err());

        p.instagram = Some("https://instagram.com/acme".to_string());
        assert!(p.validate(YEAR).is_ok());
    }

    #[test]
    fn test_normalize_clears_blank_optionals() {
        let mut p = profile("  Acme  ");
        p.phone_number = Some("".to_string());
        p.instagram = Some("   ".to_string());
        p.location.country = "jp".to_string();
        p.normalize();

        assert_eq!(p.name, "Acme");
        assert_eq!(p.phone_number, None);
        assert_eq!(p.instagram, None);
        assert_eq!(p.location.country, "JP");
        assert!(p.validate(YEAR).is_ok());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut p = profile("Acme");
        p.twitter = Some("https://twitter.com/acme".to_string());

        let patch = OrganizationPatch {
            description: Some("New description".to_string()),
            representative: Some(Representative {
                first_name: "Anakin".to_string(),
                last_name: "Skywalker".to_string(),
            }),
            twitter: Some(String::new()),
            ..OrganizationPatch::default()
        };
        patch.apply(&mut p);
        p.normalize();

        assert_eq!(p.name, "Acme");
        assert_eq!(p.description, "New description");
        assert_eq!(p.representative.first_name, "Anakin");
        assert_eq!(p.twitter, None);
    }

    #[test]
    fn test_matches_keyword() {
        let p = profile("example-brewery");
        assert!(p.matches_keyword("EXAMPLE"));
        assert!(p.matches_keyword("tokyo"));
        assert!(!p.matches_keyword("seoul"));
    }

    #[test]
    fn test_profile_deserializes_camel_case_with_defaults() {
        let json = serde_json::json!({
            "name": "Chebacca Inc.",
            "description": "May the force be with you.",
            "representative": {"firstName": "Luke", "lastName": "Skywalker"},
            "website": "http://falcon.example.com",
            "foundedIn": 2001,
            "location": {"country": "JP"},
            "phoneNumber": ""
        });
        let p: OrganizationProfile = serde_json::from_value(json).unwrap();

        assert_eq!(p.tour_availability, TOUR_UNKNOWN);
        assert_eq!(p.location.city, "");
        assert_eq!(p.phone_number.as_deref(), Some(""));
        assert_eq!(p.instagram, None);
    }
}
