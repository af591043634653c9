use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable service, e.g. "Gel Manicure".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentType {
    pub fn price(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentTypeRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointmentTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Generate a URL-safe slug from a name
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Default services to seed (name, slug, price_cents, duration_minutes)
pub fn default_appointment_types() -> Vec<(&'static str, &'static str, i64, i32)> {
    vec![
        ("Classic Manicure", "classic-manicure", 35_000, 45),
        ("Gel Manicure", "gel-manicure", 65_000, 60),
        ("Classic Pedicure", "classic-pedicure", 45_000, 60),
        ("Soft Gel Extensions", "soft-gel-extensions", 120_000, 120),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gel Manicure"), "gel-manicure");
        assert_eq!(slugify("  Nail   Art  "), "nail-art");
        assert_eq!(slugify("Mani + Pedi!"), "mani-pedi");
    }

    #[test]
    fn test_default_slugs_match_names() {
        for (name, slug, price, duration) in default_appointment_types() {
            assert_eq!(slugify(name), slug);
            assert!(price > 0);
            assert!(duration > 0);
        }
    }
}
