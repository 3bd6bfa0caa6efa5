//! Canonical text templates. Both functions are pure: the same record always
//! yields byte-identical output.

use crate::models::HotelRecord;

/// Text stored in `search_text` and matched by the substring index.
pub fn lexical_text(hotel: &HotelRecord) -> String {
    format!(
        "{} {} {} {}star cleanliness{} comfort{} facilities{}",
        hotel.name,
        hotel.city,
        hotel.country,
        hotel.stars,
        hotel.cleanliness,
        hotel.comfort,
        hotel.facilities
    )
    .to_lowercase()
}

/// Sentence fed to the embedding models.
pub fn dense_text(hotel: &HotelRecord) -> String {
    format!(
        "Hotel {} in {}, {}. {} star rating. Cleanliness score: {}. Comfort score: {}. Facilities score: {}.",
        hotel.name,
        hotel.city,
        hotel.country,
        hotel.stars,
        hotel.cleanliness,
        hotel.comfort,
        hotel.facilities
    )
}
