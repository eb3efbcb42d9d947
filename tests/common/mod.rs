//! Shared fixtures: a deterministic synthetic listing dataset

#![allow(dead_code)]

use std::path::{Path, PathBuf};

const PROPERTY_TYPES: [&str; 3] = ["House", "Flat", "Upper Portion"];
const CITIES: [(&str, &[&str]); 3] = [
    ("Islamabad", &["G-10", "F-7", "E-11"]),
    ("Lahore", &["DHA Defence", "Bahria Town"]),
    ("Karachi", &["Clifton", "Gulshan-e-Iqbal"]),
];
const PURPOSES: [&str; 2] = ["For Sale", "For Rent"];

/// CSV text with the seven listing fields, a `price` target and one extra
/// column the listing variant ignores.
pub fn listing_csv(rows: usize) -> String {
    let mut out = String::from(
        "property_id,property_type,location,city,baths,purpose,bedrooms,Area_in_Marla,price\n",
    );

    for i in 0..rows {
        let property_type = PROPERTY_TYPES[i % PROPERTY_TYPES.len()];
        let (city, locations) = CITIES[(i / 3) % CITIES.len()];
        let location = locations[i % locations.len()];
        let purpose = PURPOSES[(i / 7) % PURPOSES.len()];
        let bedrooms = 1 + i % 6;
        let baths = 1 + (i * 7) % 5;
        let area = 3.0 + ((i * 13) % 40) as f64 * 0.5;

        let city_factor = match city {
            "Islamabad" => 1.4,
            "Lahore" => 1.1,
            _ => 1.0,
        };
        let purpose_factor = if purpose == "For Rent" { 0.01 } else { 1.0 };
        let price = (area * 900_000.0 + bedrooms as f64 * 350_000.0 + baths as f64 * 120_000.0)
            * city_factor
            * purpose_factor;

        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{:.0}\n",
            1000 + i,
            property_type,
            location,
            city,
            baths,
            purpose,
            bedrooms,
            area,
            price
        ));
    }

    out
}

/// Write [`listing_csv`] into `dir` and return its path
pub fn write_listing_csv(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("House_dataset.csv");
    std::fs::write(&path, listing_csv(rows)).unwrap();
    path
}

/// The listing used in the API documentation
pub fn example_listing() -> serde_json::Value {
    serde_json::json!({
        "property_type": "House",
        "location": "G-10",
        "city": "Islamabad",
        "baths": 3,
        "purpose": "For Sale",
        "bedrooms": 4,
        "Area_in_Marla": 8.0
    })
}
