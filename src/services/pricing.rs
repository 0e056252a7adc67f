use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    High,
    Mid,
    Low,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Weekday,
    Weekend,
}

/// Weekend nights start Thursday through Sunday. The four-day definition is
/// the house rule, not the conventional Saturday/Sunday pair.
pub fn day_kind(date: NaiveDate) -> DayKind {
    match date.weekday() {
        Weekday::Thu | Weekday::Fri | Weekday::Sat | Weekday::Sun => DayKind::Weekend,
        _ => DayKind::Weekday,
    }
}

/// Easter Sunday for a Gregorian year (Anonymous Gregorian computus).
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

/// Thursday on/before May 31, i.e. the first high-season night.
pub fn high_season_start(year: i32) -> NaiveDate {
    let may_31 = ymd(year, 5, 31);
    let offset = (may_31.weekday().num_days_from_monday() + 4) % 7;
    may_31 - Duration::days(i64::from(offset))
}

/// Last Monday on/before July 31; the high season ends the day before.
pub fn last_monday_of_july(year: i32) -> NaiveDate {
    let july_31 = ymd(year, 7, 31);
    july_31 - Duration::days(i64::from(july_31.weekday().num_days_from_monday()))
}

/// Third Sunday of October, counting the week containing October 1 as week
/// one: the first Sunday on/after October 1, advanced by two weeks.
pub fn third_october_sunday(year: i32) -> NaiveDate {
    let october_1 = ymd(year, 10, 1);
    let to_sunday = (6 - october_1.weekday().num_days_from_monday()) % 7;
    october_1 + Duration::days(i64::from(to_sunday) + 14)
}

/// Classify a calendar date into a rate tier.
///
/// Strict priority chain: the Easter and Christmas/New Year windows override
/// the calendar-position windows, and each branch returns immediately.
pub fn classify_season(date: NaiveDate) -> Season {
    let year = date.year();

    let easter = easter_sunday(year);
    if date >= easter - Duration::days(5) && date <= easter + Duration::days(2) {
        return Season::Mid;
    }
    if (date >= ymd(year, 12, 20) && date <= ymd(year, 12, 31))
        || (date >= ymd(year, 1, 1) && date <= ymd(year, 1, 6))
    {
        return Season::Mid;
    }

    let high_start = high_season_start(year);
    let summer_monday = last_monday_of_july(year);
    let high_end = summer_monday - Duration::days(1);
    if date >= high_start && date <= high_end {
        return Season::High;
    }

    if (date >= ymd(year, 4, 1) && date < high_start)
        || (date >= summer_monday && date <= ymd(year, 8, 31))
        || (date >= ymd(year, 9, 1) && date <= third_october_sunday(year))
    {
        return Season::Mid;
    }

    Season::Low
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("calendar arithmetic stays in range")
}

// ---------------------------------------------------------------------------
// Rate table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeasonRates {
    pub base_nightly: f64,
    pub weekend_nightly: f64,
    pub base_occupancy: u32,
    pub max_occupancy: u32,
}

impl SeasonRates {
    pub fn nightly(&self, kind: DayKind) -> f64 {
        match kind {
            DayKind::Weekday => self.base_nightly,
            DayKind::Weekend => self.weekend_nightly,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateTable {
    pub high: SeasonRates,
    pub mid: SeasonRates,
    pub low: SeasonRates,
    pub extra_guest_fee: f64,
    pub cleaning_fee: f64,
    pub min_stay_nights: u32,
    pub long_stay_nights: u32,
    pub long_stay_discount: f64,
}

impl RateTable {
    pub fn season(&self, season: Season) -> &SeasonRates {
        match season {
            Season::High => &self.high,
            Season::Mid => &self.mid,
            Season::Low => &self.low,
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            high: SeasonRates {
                base_nightly: 2000.0,
                weekend_nightly: 3100.0,
                base_occupancy: 16,
                max_occupancy: 24,
            },
            mid: SeasonRates {
                base_nightly: 1500.0,
                weekend_nightly: 2200.0,
                base_occupancy: 16,
                max_occupancy: 24,
            },
            low: SeasonRates {
                base_nightly: 1200.0,
                weekend_nightly: 1200.0,
                base_occupancy: 10,
                max_occupancy: 22,
            },
            extra_guest_fee: 100.0,
            cleaning_fee: 600.0,
            min_stay_nights: 3,
            long_stay_nights: 7,
            long_stay_discount: 0.15,
        }
    }
}

// ---------------------------------------------------------------------------
// Nightly rate calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StayRequest {
    pub arrival: NaiveDate,
    pub nights: u32,
    pub guests: u32,
}

impl StayRequest {
    pub fn departure(&self) -> NaiveDate {
        self.arrival + Duration::days(i64::from(self.nights))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NightCharge {
    pub date: NaiveDate,
    pub season: Season,
    pub day_kind: DayKind,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentalBreakdown {
    pub nights: Vec<NightCharge>,
    pub subtotal: f64,
    pub capacity_warnings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Minimum stay is {min_stay} nights, requested {nights}.")]
    StayTooShort { nights: u32, min_stay: u32 },
    #[error("At least one guest is required.")]
    NoGuests,
    #[error("Channel commission rate must be between 0 and 1, got {0}.")]
    InvalidCommissionRate(f64),
}

/// Price every night of a stay.
///
/// Capacity policy: a night whose season cap is exceeded produces a warning
/// naming the season and its maximum; the overage fee is still charged and
/// pricing proceeds. Warnings are deduplicated per season.
pub fn price_stay(stay: &StayRequest, table: &RateTable) -> Result<RentalBreakdown, PricingError> {
    if stay.guests == 0 {
        return Err(PricingError::NoGuests);
    }
    if stay.nights < table.min_stay_nights {
        return Err(PricingError::StayTooShort {
            nights: stay.nights,
            min_stay: table.min_stay_nights,
        });
    }

    let mut nights = Vec::with_capacity(stay.nights as usize);
    let mut subtotal = 0.0;
    let mut warned: Vec<Season> = Vec::new();
    let mut capacity_warnings = Vec::new();

    for offset in 0..stay.nights {
        let date = stay.arrival + Duration::days(i64::from(offset));
        let season = classify_season(date);
        let kind = day_kind(date);
        let rates = table.season(season);

        if stay.guests > rates.max_occupancy && !warned.contains(&season) {
            warned.push(season);
            capacity_warnings.push(format!(
                "Too many guests for the {} season (max {}).",
                season.as_str(),
                rates.max_occupancy
            ));
        }

        let overage = stay.guests.saturating_sub(rates.base_occupancy);
        let amount = rates.nightly(kind) + f64::from(overage) * table.extra_guest_fee;
        subtotal += amount;
        nights.push(NightCharge {
            date,
            season,
            day_kind: kind,
            amount,
        });
    }

    Ok(RentalBreakdown {
        nights,
        subtotal,
        capacity_warnings,
    })
}

// ---------------------------------------------------------------------------
// Service catalog and extras aggregator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceCategory {
    HeadcountFee,
    LumpSum,
    PerUse,
    Standard,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceDefinition {
    pub name: &'static str,
    pub category: ServiceCategory,
    pub default_unit_price: f64,
}

/// Fixed, ordered service catalog. Sink rows and CSV exports reserve one
/// four-column block per entry, in this order.
pub const SERVICE_CATALOG: &[ServiceDefinition] = &[
    ServiceDefinition {
        name: "Wedding Fee",
        category: ServiceCategory::HeadcountFee,
        default_unit_price: 30.0,
    },
    ServiceDefinition {
        name: "Breakfast",
        category: ServiceCategory::Standard,
        default_unit_price: 20.0,
    },
    ServiceDefinition {
        name: "Lunch",
        category: ServiceCategory::Standard,
        default_unit_price: 45.0,
    },
    ServiceDefinition {
        name: "Dinner",
        category: ServiceCategory::Standard,
        default_unit_price: 75.0,
    },
    ServiceDefinition {
        name: "BBQ",
        category: ServiceCategory::Standard,
        default_unit_price: 60.0,
    },
    ServiceDefinition {
        name: "Cooking Class",
        category: ServiceCategory::Standard,
        default_unit_price: 120.0,
    },
    ServiceDefinition {
        name: "Wine Tasting",
        category: ServiceCategory::Standard,
        default_unit_price: 50.0,
    },
    ServiceDefinition {
        name: "Truffle Hunting",
        category: ServiceCategory::Standard,
        default_unit_price: 150.0,
    },
    ServiceDefinition {
        name: "Ebike Tour",
        category: ServiceCategory::Standard,
        default_unit_price: 80.0,
    },
    ServiceDefinition {
        name: "Transfer",
        category: ServiceCategory::PerUse,
        default_unit_price: 150.0,
    },
    ServiceDefinition {
        name: "Provisioning",
        category: ServiceCategory::LumpSum,
        default_unit_price: 0.0,
    },
    ServiceDefinition {
        name: "Extra Cleaning",
        category: ServiceCategory::PerUse,
        default_unit_price: 200.0,
    },
];

#[derive(Debug, Clone, Default)]
pub struct ServiceSelection {
    pub name: String,
    pub unit_price: Option<f64>,
    pub attendees: Option<u32>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCharge {
    pub name: String,
    pub category: ServiceCategory,
    pub unit_price: f64,
    pub attendees: u32,
    pub quantity: u32,
    pub subtotal: f64,
}

/// Resolve selections against the catalog and sum the active ones.
///
/// A selection activates only under its category's predicate; everything
/// else contributes zero and is left out of the itemized list. Selections
/// naming services outside the catalog are ignored.
pub fn aggregate_extras(
    catalog: &[ServiceDefinition],
    selections: &[ServiceSelection],
) -> (Vec<ServiceCharge>, f64) {
    let mut charges = Vec::new();
    let mut total = 0.0;

    for definition in catalog {
        let Some(selection) = selections
            .iter()
            .find(|candidate| candidate.name == definition.name)
        else {
            continue;
        };

        let unit_price = selection
            .unit_price
            .unwrap_or(definition.default_unit_price);
        if !unit_price.is_finite() || unit_price <= 0.0 {
            continue;
        }

        let (attendees, quantity) = match definition.category {
            ServiceCategory::HeadcountFee => (selection.attendees.unwrap_or(0), 1),
            ServiceCategory::LumpSum => (1, 1),
            ServiceCategory::PerUse => (1, selection.quantity.unwrap_or(0)),
            ServiceCategory::Standard => (
                selection.attendees.unwrap_or(0),
                selection.quantity.unwrap_or(0),
            ),
        };
        if attendees == 0 || quantity == 0 {
            continue;
        }

        let subtotal = unit_price * f64::from(attendees) * f64::from(quantity);
        total += subtotal;
        charges.push(ServiceCharge {
            name: definition.name.to_string(),
            category: definition.category,
            unit_price,
            attendees,
            quantity,
            subtotal,
        });
    }

    (charges, total)
}

// ---------------------------------------------------------------------------
// Channel adjustment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelDirection {
    /// The computed rental is the amount the venue must net; the listing
    /// price is grossed up by the channel commission.
    NetToListing,
    /// The computed rental is the channel listing price; the venue nets the
    /// amount left after commission.
    ListingToNet,
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub label: String,
    pub commission_rate: f64,
    pub direction: ChannelDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelAdjustment {
    pub label: String,
    pub commission_rate: f64,
    pub direction: ChannelDirection,
    pub listing_amount: f64,
    pub net_amount: f64,
}

pub fn apply_channel(
    rental: f64,
    channel: &ChannelConfig,
) -> Result<ChannelAdjustment, PricingError> {
    let rate = channel.commission_rate;
    if !rate.is_finite() || rate <= 0.0 || rate >= 1.0 {
        return Err(PricingError::InvalidCommissionRate(rate));
    }

    let (listing_amount, net_amount) = match channel.direction {
        ChannelDirection::NetToListing => (rental / (1.0 - rate), rental),
        ChannelDirection::ListingToNet => (rental, rental * (1.0 - rate)),
    };

    Ok(ChannelAdjustment {
        label: channel.label.clone(),
        commission_rate: rate,
        direction: channel.direction,
        listing_amount,
        net_amount,
    })
}

// ---------------------------------------------------------------------------
// Quote assembler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountInputs {
    pub manual_discount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub stay: StayRequest,
    pub nightly_breakdown: Vec<NightCharge>,
    pub capacity_warnings: Vec<String>,
    pub rental_subtotal: f64,
    pub long_stay_discount_applied: bool,
    pub channel: Option<ChannelAdjustment>,
    pub rental_amount: f64,
    pub cleaning_fee: f64,
    pub service_charges: Vec<ServiceCharge>,
    pub extras_total: f64,
    pub manual_discount: f64,
    pub total: f64,
    pub average_nightly_rate: f64,
    pub summary_lines: Vec<String>,
}

/// Assemble a full quote from validated stay inputs.
///
/// Order of operations: nightly subtotal, long-stay discount on the
/// pre-channel amount, channel adjustment, cleaning fee, extras, manual
/// discount. Intermediate amounts are never rounded; presentation layers
/// round at the boundary.
pub fn compute_quote(
    stay: &StayRequest,
    table: &RateTable,
    catalog: &[ServiceDefinition],
    selections: &[ServiceSelection],
    discounts: &DiscountInputs,
    channel: Option<&ChannelConfig>,
) -> Result<Quote, PricingError> {
    let breakdown = price_stay(stay, table)?;

    let long_stay_discount_applied = stay.nights >= table.long_stay_nights;
    let discounted_rental = if long_stay_discount_applied {
        breakdown.subtotal * (1.0 - table.long_stay_discount)
    } else {
        breakdown.subtotal
    };

    let channel_adjustment = match channel {
        Some(config) => Some(apply_channel(discounted_rental, config)?),
        None => None,
    };
    let rental_amount = channel_adjustment
        .as_ref()
        .map(|adjustment| adjustment.listing_amount)
        .unwrap_or(discounted_rental);

    let (service_charges, extras_total) = aggregate_extras(catalog, selections);
    let manual_discount = discounts.manual_discount.max(0.0);
    let total = rental_amount + table.cleaning_fee + extras_total - manual_discount;
    let average_nightly_rate = rental_amount / f64::from(stay.nights);

    let mut summary_lines = Vec::new();
    if long_stay_discount_applied {
        summary_lines.push(format!(
            "Rental {} nights ({}% long-stay discount): €{}",
            stay.nights,
            (table.long_stay_discount * 100.0).round() as i64,
            format_amount(rental_amount)
        ));
    } else {
        summary_lines.push(format!(
            "Rental {} nights: €{}",
            stay.nights,
            format_amount(rental_amount)
        ));
    }
    if let Some(adjustment) = &channel_adjustment {
        summary_lines.push(format!(
            "{} listing ({}% commission), venue nets €{}",
            adjustment.label,
            (adjustment.commission_rate * 100.0).round() as i64,
            format_amount(adjustment.net_amount)
        ));
    }
    summary_lines.push(format!(
        "Final cleaning: €{}",
        format_amount(table.cleaning_fee)
    ));
    for charge in &service_charges {
        summary_lines.push(summary_line(charge));
    }
    if manual_discount > 0.0 {
        summary_lines.push(format!(
            "Manual discount: -€{}",
            format_amount(manual_discount)
        ));
    }

    Ok(Quote {
        stay: *stay,
        nightly_breakdown: breakdown.nights,
        capacity_warnings: breakdown.capacity_warnings,
        rental_subtotal: breakdown.subtotal,
        long_stay_discount_applied,
        channel: channel_adjustment,
        rental_amount,
        cleaning_fee: table.cleaning_fee,
        service_charges,
        extras_total,
        manual_discount,
        total,
        average_nightly_rate,
        summary_lines,
    })
}

fn summary_line(charge: &ServiceCharge) -> String {
    match charge.category {
        ServiceCategory::LumpSum => {
            format!("{}: €{}", charge.name, format_amount(charge.subtotal))
        }
        ServiceCategory::HeadcountFee => format!(
            "{}: €{} x {} attendees = €{}",
            charge.name,
            format_amount(charge.unit_price),
            charge.attendees,
            format_amount(charge.subtotal)
        ),
        ServiceCategory::PerUse => format!(
            "{}: €{} x {} times = €{}",
            charge.name,
            format_amount(charge.unit_price),
            charge.quantity,
            format_amount(charge.subtotal)
        ),
        ServiceCategory::Standard => format!(
            "{}: €{} x {} pax x {} times = €{}",
            charge.name,
            format_amount(charge.unit_price),
            charge.attendees,
            charge.quantity,
            format_amount(charge.subtotal)
        ),
    }
}

// ---------------------------------------------------------------------------
// Currency helpers
// ---------------------------------------------------------------------------

/// Two-decimal, dot-separated rendering. The single place money gets
/// rounded.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Parse loosely formatted currency text into an amount.
///
/// Accepts both decimal-comma and decimal-dot inputs (legacy exports mix
/// them); anything non-numeric is "absent", never an error.
pub fn parse_optional_currency(text: &str) -> Option<f64> {
    let cleaned = text.trim().trim_start_matches('€').trim();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned.to_string(),
    };

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn stay(arrival: NaiveDate, nights: u32, guests: u32) -> StayRequest {
        StayRequest {
            arrival,
            nights,
            guests,
        }
    }

    #[test]
    fn computes_easter_sunday() {
        assert_eq!(easter_sunday(2024), date(2024, 3, 31));
        assert_eq!(easter_sunday(2025), date(2025, 4, 20));
        assert_eq!(easter_sunday(2026), date(2026, 4, 5));
        assert_eq!(easter_sunday(2000), date(2000, 4, 23));
    }

    #[test]
    fn easter_window_overrides_low_season() {
        // Easter 2024 falls on March 31; its window starts March 26, before
        // the spring mid window opens on April 1.
        assert_eq!(classify_season(date(2024, 3, 25)), Season::Low);
        assert_eq!(classify_season(date(2024, 3, 26)), Season::Mid);
        assert_eq!(classify_season(date(2024, 4, 2)), Season::Mid);
    }

    #[test]
    fn christmas_window_edges() {
        assert_eq!(classify_season(date(2025, 12, 19)), Season::Low);
        assert_eq!(classify_season(date(2025, 12, 20)), Season::Mid);
        assert_eq!(classify_season(date(2026, 1, 6)), Season::Mid);
        assert_eq!(classify_season(date(2026, 1, 7)), Season::Low);
    }

    #[test]
    fn high_season_bounds_2025() {
        // May 31 2025 is a Saturday; the Thursday on/before is May 29.
        assert_eq!(high_season_start(2025), date(2025, 5, 29));
        // July 31 2025 is a Thursday; the last Monday on/before is July 28.
        assert_eq!(last_monday_of_july(2025), date(2025, 7, 28));

        assert_eq!(classify_season(date(2025, 5, 28)), Season::Mid);
        assert_eq!(classify_season(date(2025, 5, 29)), Season::High);
        assert_eq!(classify_season(date(2025, 7, 27)), Season::High);
        assert_eq!(classify_season(date(2025, 7, 28)), Season::Mid);
    }

    #[test]
    fn autumn_mid_window_ends_on_third_october_sunday() {
        // October 1 2025 is a Wednesday; the Sunday of its week is October 5,
        // so the third Sunday is October 19.
        assert_eq!(third_october_sunday(2025), date(2025, 10, 19));
        assert_eq!(classify_season(date(2025, 10, 19)), Season::Mid);
        assert_eq!(classify_season(date(2025, 10, 20)), Season::Low);
    }

    #[test]
    fn classification_is_pure() {
        let day = date(2025, 7, 1);
        assert_eq!(classify_season(day), classify_season(day));
        assert_eq!(classify_season(day), Season::High);
    }

    #[test]
    fn thursday_counts_as_weekend() {
        assert_eq!(day_kind(date(2025, 7, 2)), DayKind::Weekday); // Wednesday
        assert_eq!(day_kind(date(2025, 7, 3)), DayKind::Weekend); // Thursday
        assert_eq!(day_kind(date(2025, 7, 6)), DayKind::Weekend); // Sunday
        assert_eq!(day_kind(date(2025, 7, 7)), DayKind::Weekday); // Monday
    }

    #[test]
    fn low_season_weekday_stay_prices_base_rate() {
        // Monday through Wednesday nights in November: low season, no
        // weekend nights, guests within base occupancy.
        let table = RateTable::default();
        let breakdown = price_stay(&stay(date(2025, 11, 10), 3, 8), &table).unwrap();
        assert_eq!(breakdown.subtotal, 3.0 * 1200.0);
        assert!(breakdown.capacity_warnings.is_empty());
        assert!(breakdown
            .nights
            .iter()
            .all(|night| night.season == Season::Low && night.day_kind == DayKind::Weekday));
    }

    #[test]
    fn extra_guests_charged_per_night() {
        let table = RateTable::default();
        // Low season base occupancy is 10; 12 guests pay 2 x 100 per night.
        let breakdown = price_stay(&stay(date(2025, 11, 10), 3, 12), &table).unwrap();
        assert_eq!(breakdown.subtotal, 3.0 * (1200.0 + 200.0));
    }

    #[test]
    fn capacity_overflow_warns_and_still_charges() {
        let table = RateTable::default();
        // Low season cap is 22.
        let breakdown = price_stay(&stay(date(2025, 11, 10), 3, 23), &table).unwrap();
        assert_eq!(breakdown.capacity_warnings.len(), 1);
        assert!(breakdown.capacity_warnings[0].contains("low"));
        assert!(breakdown.capacity_warnings[0].contains("22"));
        assert_eq!(breakdown.subtotal, 3.0 * (1200.0 + 13.0 * 100.0));
    }

    #[test]
    fn rejects_stays_below_minimum() {
        let table = RateTable::default();
        let error = price_stay(&stay(date(2025, 11, 10), 2, 4), &table).unwrap_err();
        assert!(matches!(
            error,
            PricingError::StayTooShort {
                nights: 2,
                min_stay: 3
            }
        ));
    }

    #[test]
    fn long_stay_discount_applies_at_seven_nights() {
        let table = RateTable::default();
        let selections: Vec<ServiceSelection> = Vec::new();

        // November 3 2025 is a Monday; all seven nights are low season where
        // weekday and weekend rates coincide.
        let arrival = date(2025, 11, 3);
        let seven = compute_quote(
            &stay(arrival, 7, 8),
            &table,
            SERVICE_CATALOG,
            &selections,
            &DiscountInputs::default(),
            None,
        )
        .unwrap();
        assert!(seven.long_stay_discount_applied);
        assert_eq!(seven.rental_subtotal, 7.0 * 1200.0);
        assert!((seven.rental_amount - 7.0 * 1200.0 * 0.85).abs() < 1e-9);

        let six = compute_quote(
            &stay(arrival, 6, 8),
            &table,
            SERVICE_CATALOG,
            &selections,
            &DiscountInputs::default(),
            None,
        )
        .unwrap();
        assert!(!six.long_stay_discount_applied);
        assert_eq!(six.rental_amount, six.rental_subtotal);
    }

    #[test]
    fn channel_inversion_round_trips() {
        for rate in [0.03, 0.15, 0.18, 0.25, 0.9] {
            let config = ChannelConfig {
                label: "marketplace".to_string(),
                commission_rate: rate,
                direction: ChannelDirection::NetToListing,
            };
            let net = 8400.0;
            let adjustment = apply_channel(net, &config).unwrap();
            assert!((adjustment.listing_amount * (1.0 - rate) - net).abs() < 1e-6);
            assert_eq!(adjustment.net_amount, net);
        }
    }

    #[test]
    fn listing_to_net_keeps_listing_amount() {
        let config = ChannelConfig {
            label: "marketplace".to_string(),
            commission_rate: 0.18,
            direction: ChannelDirection::ListingToNet,
        };
        let adjustment = apply_channel(10_000.0, &config).unwrap();
        assert_eq!(adjustment.listing_amount, 10_000.0);
        assert!((adjustment.net_amount - 8200.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_commission() {
        let config = ChannelConfig {
            label: "marketplace".to_string(),
            commission_rate: 1.0,
            direction: ChannelDirection::NetToListing,
        };
        assert!(matches!(
            apply_channel(100.0, &config),
            Err(PricingError::InvalidCommissionRate(_))
        ));
    }

    #[test]
    fn lump_sum_activates_on_total_cost_alone() {
        let zero = [ServiceSelection {
            name: "Provisioning".to_string(),
            unit_price: Some(0.0),
            ..Default::default()
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &zero);
        assert!(charges.is_empty());
        assert_eq!(total, 0.0);

        let hundred = [ServiceSelection {
            name: "Provisioning".to_string(),
            unit_price: Some(100.0),
            ..Default::default()
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &hundred);
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].subtotal, 100.0);
        assert_eq!(total, 100.0);
    }

    #[test]
    fn headcount_fee_ignores_quantity() {
        let selections = [ServiceSelection {
            name: "Wedding Fee".to_string(),
            unit_price: Some(30.0),
            attendees: Some(80),
            quantity: Some(5),
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &selections);
        assert_eq!(charges[0].quantity, 1);
        assert_eq!(total, 30.0 * 80.0);
    }

    #[test]
    fn per_use_services_need_no_attendees() {
        let selections = [ServiceSelection {
            name: "Transfer".to_string(),
            unit_price: Some(150.0),
            attendees: None,
            quantity: Some(2),
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &selections);
        assert_eq!(charges[0].attendees, 1);
        assert_eq!(total, 300.0);
    }

    #[test]
    fn standard_services_require_all_three_fields() {
        let incomplete = [ServiceSelection {
            name: "Dinner".to_string(),
            unit_price: Some(75.0),
            attendees: Some(10),
            quantity: None,
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &incomplete);
        assert!(charges.is_empty());
        assert_eq!(total, 0.0);

        let complete = [ServiceSelection {
            name: "Dinner".to_string(),
            unit_price: Some(75.0),
            attendees: Some(10),
            quantity: Some(2),
        }];
        let (_, total) = aggregate_extras(SERVICE_CATALOG, &complete);
        assert_eq!(total, 1500.0);
    }

    #[test]
    fn defaults_unit_price_from_catalog() {
        let selections = [ServiceSelection {
            name: "Breakfast".to_string(),
            unit_price: None,
            attendees: Some(10),
            quantity: Some(3),
        }];
        let (charges, _) = aggregate_extras(SERVICE_CATALOG, &selections);
        assert_eq!(charges[0].unit_price, 20.0);
        assert_eq!(charges[0].subtotal, 600.0);
    }

    #[test]
    fn unknown_services_are_ignored() {
        let selections = [ServiceSelection {
            name: "Helicopter".to_string(),
            unit_price: Some(1000.0),
            attendees: Some(4),
            quantity: Some(1),
        }];
        let (charges, total) = aggregate_extras(SERVICE_CATALOG, &selections);
        assert!(charges.is_empty());
        assert_eq!(total, 0.0);
    }

    #[test]
    fn high_season_weekday_quote_end_to_end() {
        // June 30 2025 is a Monday: three high-season weekday nights, ten
        // guests within the base occupancy of sixteen.
        let table = RateTable::default();
        let quote = compute_quote(
            &stay(date(2025, 6, 30), 3, 10),
            &table,
            SERVICE_CATALOG,
            &[],
            &DiscountInputs::default(),
            None,
        )
        .unwrap();

        assert_eq!(quote.rental_subtotal, 3.0 * 2000.0);
        assert!(quote.capacity_warnings.is_empty());
        assert_eq!(quote.total, 6000.0 + 600.0);
        assert_eq!(quote.average_nightly_rate, 2000.0);
        assert_eq!(quote.stay.departure(), date(2025, 7, 3));
    }

    #[test]
    fn july_first_stay_hits_thursday_weekend_rate() {
        // Arrival Tuesday July 1 2025: the third night starts Thursday and
        // takes the weekend rate under the four-day rule.
        let table = RateTable::default();
        let quote = compute_quote(
            &stay(date(2025, 7, 1), 3, 10),
            &table,
            SERVICE_CATALOG,
            &[],
            &DiscountInputs::default(),
            None,
        )
        .unwrap();
        assert_eq!(quote.rental_subtotal, 2000.0 + 2000.0 + 3100.0);
    }

    #[test]
    fn manual_discount_reduces_total() {
        let table = RateTable::default();
        let quote = compute_quote(
            &stay(date(2025, 11, 10), 3, 8),
            &table,
            SERVICE_CATALOG,
            &[],
            &DiscountInputs {
                manual_discount: 250.0,
            },
            None,
        )
        .unwrap();
        assert_eq!(quote.total, 3.0 * 1200.0 + 600.0 - 250.0);

        let negative = compute_quote(
            &stay(date(2025, 11, 10), 3, 8),
            &table,
            SERVICE_CATALOG,
            &[],
            &DiscountInputs {
                manual_discount: -50.0,
            },
            None,
        )
        .unwrap();
        assert_eq!(negative.manual_discount, 0.0);
    }

    #[test]
    fn parses_loose_currency_text() {
        assert_eq!(parse_optional_currency("1234.56"), Some(1234.56));
        assert_eq!(parse_optional_currency("1,5"), Some(1.5));
        assert_eq!(parse_optional_currency("1.234,56"), Some(1234.56));
        assert_eq!(parse_optional_currency("1,234.56"), Some(1234.56));
        assert_eq!(parse_optional_currency("€ 600"), Some(600.0));
        assert_eq!(parse_optional_currency("abc"), None);
        assert_eq!(parse_optional_currency(""), None);
    }

    #[test]
    fn formats_amounts_with_two_decimals() {
        assert_eq!(format_amount(600.0), "600.00");
        assert_eq!(format_amount(7139.999999), "7140.00");
    }
}
