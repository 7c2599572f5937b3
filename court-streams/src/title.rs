//! Broadcast titles such as `Quadra 8 - sábado, 13 de janeiro de 2024`.
//!
//! Dates use the CLDR "full" date pattern of the target locale, which is what viewers of the
//! channel have always seen in the titles.

use crate::config::Locale;
use jiff::civil::Date;

const PT_BR_WEEKDAYS: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];

const PT_BR_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

const EN_US_WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const EN_US_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl Locale {
    /// Formats `date` with this locale's full date pattern.
    pub fn full_date(self, date: Date) -> String {
        let weekday = usize::try_from(date.weekday().to_monday_zero_offset()).unwrap_or(0);
        let month = usize::try_from(date.month() - 1).unwrap_or(0);
        match self {
            // EEEE, d 'de' MMMM 'de' y
            Locale::PtBr => format!(
                "{}, {} de {} de {}",
                PT_BR_WEEKDAYS[weekday],
                date.day(),
                PT_BR_MONTHS[month],
                date.year()
            ),
            // EEEE, MMMM d, y
            Locale::EnUs => format!(
                "{}, {} {}, {}",
                EN_US_WEEKDAYS[weekday],
                EN_US_MONTHS[month],
                date.day(),
                date.year()
            ),
        }
    }
}

/// Title of the broadcast for `venue_name` on `date`, in the given locale.
pub fn title_for_locale(venue_name: &str, date: Date, locale: Locale) -> String {
    format!("{venue_name} - {}", locale.full_date(date))
}

/// Title of the broadcast for `venue_name` on `date`, in Brazilian Portuguese.
pub fn title_for(venue_name: &str, date: Date) -> String {
    title_for_locale(venue_name, date, Locale::PtBr)
}
