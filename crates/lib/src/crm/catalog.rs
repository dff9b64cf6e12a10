//! Static category catalog: the 13 supported categories, their labels,
//! classification synonyms, and required fields for creation.
//!
//! The backend may expose more modules; everything outside this allow-list is
//! invisible to users. The live catalog fetched each invocation only refreshes
//! the human labels.

use crate::crm::client::{RawModule, RecordMap};

/// The closed set of data categories this assistant serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryId {
    UnitOwnerDatabase,
    PropertyUnitsDatabase,
    GuestsDatabase,
    Bookings,
    AirbnbServices,
    AirbnbWaterBills,
    RentalProperties,
    RentalManagement,
    Tenants,
    MonthlyRent,
    RentalWaterBills,
    RentalsService,
    RentalPayments,
}

/// All supported categories, in prompt/listing order.
pub const SUPPORTED_CATEGORIES: [CategoryId; 13] = [
    CategoryId::PropertyUnitsDatabase,
    CategoryId::UnitOwnerDatabase,
    CategoryId::GuestsDatabase,
    CategoryId::Bookings,
    CategoryId::AirbnbServices,
    CategoryId::AirbnbWaterBills,
    CategoryId::RentalProperties,
    CategoryId::RentalManagement,
    CategoryId::Tenants,
    CategoryId::MonthlyRent,
    CategoryId::RentalWaterBills,
    CategoryId::RentalsService,
    CategoryId::RentalPayments,
];

/// Categories the photo-extraction path is allowed to create records in.
pub const PHOTO_CREATABLE: [CategoryId; 5] = [
    CategoryId::Bookings,
    CategoryId::GuestsDatabase,
    CategoryId::Tenants,
    CategoryId::MonthlyRent,
    CategoryId::UnitOwnerDatabase,
];

impl CategoryId {
    /// Stable backend identifier.
    pub fn api_name(self) -> &'static str {
        match self {
            CategoryId::UnitOwnerDatabase => "Unit_Owner_Database",
            CategoryId::PropertyUnitsDatabase => "Property_Units_Database",
            CategoryId::GuestsDatabase => "Guests_Database",
            CategoryId::Bookings => "Bookings",
            CategoryId::AirbnbServices => "Airbnb_Services",
            CategoryId::AirbnbWaterBills => "Airbnb_Water_Bills",
            CategoryId::RentalProperties => "Rental_Properties",
            CategoryId::RentalManagement => "Rental_Management",
            CategoryId::Tenants => "Tenants",
            CategoryId::MonthlyRent => "Monthly_Rent",
            CategoryId::RentalWaterBills => "Rental_Water_Bills",
            CategoryId::RentalsService => "Rentals_Service",
            CategoryId::RentalPayments => "Rental_Payments",
        }
    }

    /// Human label: the api name with spaces.
    pub fn label(self) -> String {
        self.api_name().replace('_', " ")
    }

    /// Hint line used in classifier prompts to map user vocabulary onto the
    /// category.
    pub fn synonyms(self) -> &'static str {
        match self {
            CategoryId::PropertyUnitsDatabase => {
                "units, rooms, apartments, available units, vacant units"
            }
            CategoryId::UnitOwnerDatabase => "owners, landlords",
            CategoryId::GuestsDatabase => "guests, visitors",
            CategoryId::Bookings => "bookings, reservations, check-in, check-out, commission",
            CategoryId::AirbnbServices => "airbnb cleaning services",
            CategoryId::AirbnbWaterBills => "airbnb water bills",
            CategoryId::RentalProperties => "rental properties, rental units",
            CategoryId::RentalManagement => "leases, agreements",
            CategoryId::Tenants => "tenants, renters",
            CategoryId::MonthlyRent => "monthly rent, rent payments",
            CategoryId::RentalWaterBills => "rental water bills",
            CategoryId::RentalsService => "rental services",
            CategoryId::RentalPayments => "rental payments",
        }
    }

    /// Ordered fields that must be present before a create may dispatch.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            CategoryId::Bookings => {
                &["First_Name", "Unit", "Amount", "Checked_in", "Checked_out"]
            }
            CategoryId::Tenants => &["Contact_Name", "Contact_Phone"],
            CategoryId::GuestsDatabase => &["First_Name", "Last_Name"],
            CategoryId::MonthlyRent => {
                &["Tenant", "Rental_Properties", "Rent_Amount", "Rent_Month"]
            }
            CategoryId::UnitOwnerDatabase => &["Name", "Phone", "Units"],
            CategoryId::PropertyUnitsDatabase => {
                &["Unit_Number", "Unit_Status", "Nightly_Rate"]
            }
            CategoryId::RentalProperties => &["Unit_Number", "Property_Status"],
            CategoryId::RentalManagement => &["Property", "Tenant", "Rent_Amount"],
            CategoryId::AirbnbServices => &["Owner_Name", "Unit", "Amount", "Service"],
            CategoryId::AirbnbWaterBills => {
                &["Owner_Name", "Unit", "Meter_Reading", "Total_Water_Bill"]
            }
            CategoryId::RentalWaterBills => &["Client_Name", "Unit", "Meter_Reading"],
            CategoryId::RentalsService => &["Client_Name", "Unit", "Amount"],
            CategoryId::RentalPayments => &["Client_Name", "Unit_Number", "Payment_Amount"],
        }
    }

    /// Resolve a backend/model-supplied name against the allow-list.
    /// Case-insensitive; anything else is unresolved.
    pub fn from_api_name(name: &str) -> Option<CategoryId> {
        let name = name.trim();
        SUPPORTED_CATEGORIES
            .into_iter()
            .find(|c| c.api_name().eq_ignore_ascii_case(name))
    }
}

/// One catalog entry as seen by this invocation: allow-listed id plus the
/// labels the backend currently reports.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub plural_label: String,
    pub singular_label: String,
}

impl Category {
    /// Catalog entry with static labels, used when the live fetch fails or
    /// omits a supported module.
    pub fn with_static_labels(id: CategoryId) -> Self {
        Self {
            id,
            plural_label: id.label(),
            singular_label: id.label(),
        }
    }
}

/// Filter a fetched module list down to the allow-list, in catalog order.
/// Backend modules outside the allow-list are dropped; supported modules the
/// backend did not return fall back to static labels so the catalog always
/// covers all 13 categories.
pub fn filter_catalog(raw: &[RawModule]) -> Vec<Category> {
    SUPPORTED_CATEGORIES
        .into_iter()
        .map(|id| {
            match raw
                .iter()
                .find(|m| m.api_name.eq_ignore_ascii_case(id.api_name()))
            {
                Some(m) => Category {
                    id,
                    plural_label: m
                        .plural_label
                        .clone()
                        .unwrap_or_else(|| id.label()),
                    singular_label: m
                        .singular_label
                        .clone()
                        .unwrap_or_else(|| id.label()),
                },
                None => Category::with_static_labels(id),
            }
        })
        .collect()
}

/// Fields still required for a create: required(category) minus the keys
/// present in the extracted data. Model-reported gaps are never trusted;
/// this recomputation is the only source of truth for the text path.
pub fn missing_fields(category: CategoryId, data: &RecordMap) -> Vec<&'static str> {
    category
        .required_fields()
        .iter()
        .copied()
        .filter(|f| !data.contains_key(*f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(keys: &[&str]) -> RecordMap {
        let mut m = RecordMap::new();
        for k in keys {
            m.insert(k.to_string(), serde_json::Value::String("x".to_string()));
        }
        m
    }

    #[test]
    fn missing_is_required_minus_present_keys() {
        let data = map(&["First_Name", "Unit", "Amount"]);
        assert_eq!(
            missing_fields(CategoryId::Bookings, &data),
            vec!["Checked_in", "Checked_out"]
        );
    }

    #[test]
    fn empty_data_misses_the_full_required_set() {
        assert_eq!(
            missing_fields(CategoryId::Bookings, &RecordMap::new()),
            CategoryId::Bookings.required_fields().to_vec()
        );
    }

    #[test]
    fn complete_data_misses_nothing() {
        let data = map(CategoryId::Tenants.required_fields());
        assert!(missing_fields(CategoryId::Tenants, &data).is_empty());
    }

    #[test]
    fn extra_fields_do_not_count_as_missing() {
        let mut data = map(CategoryId::GuestsDatabase.required_fields());
        data.insert(
            "Nationality".to_string(),
            serde_json::Value::String("Kenyan".to_string()),
        );
        assert!(missing_fields(CategoryId::GuestsDatabase, &data).is_empty());
    }

    #[test]
    fn from_api_name_is_case_insensitive_and_closed() {
        assert_eq!(
            CategoryId::from_api_name("bookings"),
            Some(CategoryId::Bookings)
        );
        assert_eq!(
            CategoryId::from_api_name(" Unit_Owner_Database "),
            Some(CategoryId::UnitOwnerDatabase)
        );
        assert_eq!(CategoryId::from_api_name("Contacts"), None);
        assert_eq!(CategoryId::from_api_name("UNKNOWN"), None);
    }

    #[test]
    fn filter_catalog_drops_unlisted_modules_and_backfills_missing_ones() {
        let raw = vec![
            RawModule {
                api_name: "Bookings".to_string(),
                plural_label: Some("Guest Bookings".to_string()),
                singular_label: Some("Booking".to_string()),
            },
            RawModule {
                api_name: "Contacts".to_string(),
                plural_label: Some("Contacts".to_string()),
                singular_label: Some("Contact".to_string()),
            },
        ];
        let catalog = filter_catalog(&raw);
        assert_eq!(catalog.len(), 13);
        assert!(catalog.iter().all(|c| c.id.api_name() != "Contacts"));
        let bookings = catalog
            .iter()
            .find(|c| c.id == CategoryId::Bookings)
            .expect("bookings");
        assert_eq!(bookings.plural_label, "Guest Bookings");
        let tenants = catalog
            .iter()
            .find(|c| c.id == CategoryId::Tenants)
            .expect("tenants");
        assert_eq!(tenants.plural_label, "Tenants");
    }
}
