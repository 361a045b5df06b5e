//! Seed an empty database with demo marketplace data.
//!
//! Inserts a handful of products for seller `1`, a tour guide profile with
//! two itineraries and a promo code valid for the next 30 days. Refuses to
//! run when products already exist so repeated runs do not duplicate data.

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

use tripmart_api::db::{
    self, ItineraryRepository, ProductRepository, PromoCodeRepository, TourGuideRepository,
};
use tripmart_api::models::itinerary::NewItinerary;
use tripmart_api::models::product::NewProduct;
use tripmart_api::models::promo_code::NewPromotion;
use tripmart_api::models::tour_guide::NewTourGuide;
use tripmart_core::{
    DateRange, Email, Nationality, PercentOff, PhoneNumber, Price, PromoCode, SellerId, Username,
};

const DEMO_SELLER: SellerId = SellerId::new(1);

/// `(name, price, quantity, description)`
const DEMO_PRODUCTS: &[(&str, &str, u32, &str)] = &[
    ("Papyrus bookmark set", "6.50", 120, "Hand-painted, set of five"),
    ("Alabaster scarab", "18.00", 40, "Carved in Luxor"),
    ("Cotton galabeya", "32.00", 25, "Egyptian cotton, one size"),
    ("Spice sampler", "12.75", 60, "Cumin, dukkah, hibiscus and more"),
];

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the database URL is missing or any insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url, 2).await?;
    info!("Connected to database");

    let products = ProductRepository::new(&pool);
    if !products.list().await?.is_empty() {
        info!("Products already present, skipping seed");
        return Ok(());
    }

    for (name, price, quantity, description) in DEMO_PRODUCTS {
        let input = NewProduct {
            name: (*name).to_owned(),
            price: Price::parse(price)?,
            description: Some((*description).to_owned()),
            picture: None,
            quantity: *quantity,
        }
        .validated()?;
        let product = products.create(DEMO_SELLER, &input).await?;
        info!(product = %product.id, name, "Seeded product");
    }

    let guide = TourGuideRepository::new(&pool)
        .create(
            &NewTourGuide {
                email: Email::parse("amira.guide@tripmart.test")?,
                username: Username::parse("amira_guide")?,
                nationality: Nationality::parse("EG")?,
                mobile: Some(PhoneNumber::parse("+20 100 555 0101")?),
                years_of_experience: 9,
                previous_works: vec!["Valley of the Kings tours".to_owned()],
            }
            .validated()?,
        )
        .await?;
    info!(tour_guide = %guide.id, "Seeded tour guide");

    let itineraries = ItineraryRepository::new(&pool);
    let start = Utc::now().date_naive();
    let dates: Vec<NaiveDate> = (1..=3).map(|weeks| start + Duration::weeks(weeks)).collect();

    for (title, price, locations) in [
        ("Giza at sunrise", "45.00", vec!["Giza Plateau", "Sphinx"]),
        ("Islamic Cairo walk", "30.00", vec!["Al-Azhar", "Khan el-Khalili"]),
    ] {
        let input = NewItinerary {
            title: title.to_owned(),
            language: "en".to_owned(),
            price: Price::parse(price)?,
            activities: vec!["Guided walk".to_owned()],
            locations: locations.into_iter().map(str::to_owned).collect(),
            available_dates: dates.clone(),
            accessibility: true,
            pickup_location: Some("Tahrir Square".to_owned()),
            dropoff_location: None,
        }
        .validated()?;
        let itinerary = itineraries.create(guide.id, &input).await?;
        info!(itinerary = %itinerary.id, title, "Seeded itinerary");
    }

    let now = Utc::now();
    let promotion = PromoCodeRepository::new(&pool)
        .create(&NewPromotion {
            code: PromoCode::parse("WELCOME10")?,
            percent_off: PercentOff::new(10)?,
            date_range: DateRange::new(now, now + Duration::days(30))?,
        })
        .await?;
    info!(code = %promotion.code, "Seeded promo code");

    info!("Seeding complete!");
    Ok(())
}
