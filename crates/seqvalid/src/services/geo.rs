//! Country names, lat/lon parsing and point-to-country lookup.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidatorError};

const BUILTIN_SHAPES: &str = include_str!("../../data/country_polygons.json");

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = 6371.0 * std::f64::consts::PI / 180.0;

static COUNTRIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Afghanistan", "Albania", "Algeria", "American Samoa", "Andorra", "Angola", "Anguilla",
        "Antarctica", "Antigua and Barbuda", "Arctic Ocean", "Argentina", "Armenia", "Aruba",
        "Ashmore and Cartier Islands", "Atlantic Ocean", "Australia", "Austria", "Azerbaijan",
        "Bahamas", "Bahrain", "Baker Island", "Baltic Sea", "Bangladesh", "Barbados",
        "Bassas da India", "Belarus", "Belgium", "Belize", "Benin", "Bermuda", "Bhutan", "Bolivia",
        "Borneo", "Bosnia and Herzegovina", "Botswana", "Bouvet Island", "Brazil",
        "British Virgin Islands", "Brunei", "Bulgaria", "Burkina Faso", "Burundi", "Cambodia",
        "Cameroon", "Canada", "Cape Verde", "Cayman Islands", "Central African Republic", "Chad",
        "Chile", "China", "Christmas Island", "Clipperton Island", "Cocos Islands", "Colombia",
        "Comoros", "Cook Islands", "Coral Sea Islands", "Costa Rica", "Cote d'Ivoire", "Croatia",
        "Cuba", "Curacao", "Cyprus", "Czechia", "Democratic Republic of the Congo", "Denmark",
        "Djibouti", "Dominica", "Dominican Republic", "Ecuador", "Egypt", "El Salvador",
        "Equatorial Guinea", "Eritrea", "Estonia", "Eswatini", "Ethiopia", "Europa Island",
        "Falkland Islands (Islas Malvinas)", "Faroe Islands", "Fiji", "Finland", "France",
        "French Guiana", "French Polynesia", "French Southern and Antarctic Lands", "Gabon",
        "Gambia", "Gaza Strip", "Georgia", "Germany", "Ghana", "Gibraltar", "Glorioso Islands",
        "Greece", "Greenland", "Grenada", "Guadeloupe", "Guam", "Guatemala", "Guernsey", "Guinea",
        "Guinea-Bissau", "Guyana", "Haiti", "Heard Island and McDonald Islands", "Honduras",
        "Hong Kong", "Howland Island", "Hungary", "Iceland", "India", "Indian Ocean", "Indonesia",
        "Iran", "Iraq", "Ireland", "Isle of Man", "Israel", "Italy", "Jamaica", "Jan Mayen",
        "Japan", "Jarvis Island", "Jersey", "Johnston Atoll", "Jordan", "Juan de Nova Island",
        "Kazakhstan", "Kenya", "Kerguelen Archipelago", "Kingman Reef", "Kiribati", "Kosovo",
        "Kuwait", "Kyrgyzstan", "Laos", "Latvia", "Lebanon", "Lesotho", "Liberia", "Libya",
        "Liechtenstein", "Line Islands", "Lithuania", "Luxembourg", "Macau", "Madagascar",
        "Malawi", "Malaysia", "Maldives", "Mali", "Malta", "Marshall Islands", "Martinique",
        "Mauritania", "Mauritius", "Mayotte", "Mediterranean Sea", "Mexico",
        "Micronesia, Federated States of", "Midway Islands", "Moldova", "Monaco", "Mongolia",
        "Montenegro", "Montserrat", "Morocco", "Mozambique", "Myanmar", "Namibia", "Nauru",
        "Navassa Island", "Nepal", "Netherlands", "New Caledonia", "New Zealand", "Nicaragua",
        "Niger", "Nigeria", "Niue", "Norfolk Island", "North Korea", "North Macedonia",
        "North Sea", "Northern Mariana Islands", "Norway", "Oman", "Pacific Ocean", "Pakistan",
        "Palau", "Palmyra Atoll", "Panama", "Papua New Guinea", "Paracel Islands", "Paraguay",
        "Peru", "Philippines", "Pitcairn Islands", "Poland", "Portugal", "Puerto Rico", "Qatar",
        "Republic of the Congo", "Reunion", "Romania", "Ross Sea", "Russia", "Rwanda",
        "Saint Barthelemy", "Saint Helena", "Saint Kitts and Nevis", "Saint Lucia",
        "Saint Martin", "Saint Pierre and Miquelon", "Saint Vincent and the Grenadines", "Samoa",
        "San Marino", "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Serbia", "Seychelles",
        "Sierra Leone", "Singapore", "Sint Maarten", "Slovakia", "Slovenia", "Solomon Islands",
        "Somalia", "South Africa", "South Georgia and the South Sandwich Islands", "South Korea",
        "South Sudan", "Southern Ocean", "Spain", "Spratly Islands", "Sri Lanka",
        "State of Palestine", "Sudan", "Suriname", "Svalbard", "Sweden", "Switzerland", "Syria",
        "Taiwan", "Tajikistan", "Tanzania", "Tasman Sea", "Thailand", "Timor-Leste", "Togo",
        "Tokelau", "Tonga", "Trinidad and Tobago", "Tromelin Island", "Tunisia", "Turkey",
        "Turkmenistan", "Turks and Caicos Islands", "Tuvalu", "Uganda", "Ukraine",
        "United Arab Emirates", "United Kingdom", "Uruguay", "USA", "Uzbekistan", "Vanuatu",
        "Venezuela", "Viet Nam", "Virgin Islands", "Wake Island", "Wallis and Futuna",
        "West Bank", "Western Sahara", "Yemen", "Zambia", "Zimbabwe",
    ]
    .into_iter()
    .collect()
});

/// Historical names and the name that replaced them.
static REPLACED_COUNTRIES: &[(&str, &str)] = &[
    ("Belgian Congo", "Democratic Republic of the Congo"),
    ("British Guiana", "Guyana"),
    ("Burma", "Myanmar"),
    ("Czech Republic", "Czechia"),
    ("Czechoslovakia", "Czechia"),
    ("East Timor", "Timor-Leste"),
    ("Korea", "South Korea"),
    ("Macedonia", "North Macedonia"),
    ("Netherlands Antilles", "Curacao"),
    ("Serbia and Montenegro", "Serbia"),
    ("Siam", "Thailand"),
    ("Swaziland", "Eswatini"),
    ("USSR", "Russia"),
    ("Yugoslavia", "Serbia"),
    ("Zaire", "Democratic Republic of the Congo"),
];

static LAT_LON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d+)?) ([NS]) (\d{1,3}(?:\.\d+)?) ([EW])$").unwrap()
});

/// What a `/country` value says about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryStatus {
    Valid,
    /// Right name, wrong capitalization.
    BadCapitalization(&'static str),
    Replaced(&'static str),
    Unknown,
}

/// Country part of a `Country: region` value.
pub fn country_part(value: &str) -> &str {
    value.split(':').next().unwrap_or(value).trim()
}

pub fn classify_country(value: &str) -> CountryStatus {
    let name = country_part(value);
    if COUNTRIES.contains(name) {
        return CountryStatus::Valid;
    }
    if let Some((_, now)) = REPLACED_COUNTRIES.iter().find(|(old, _)| old.eq_ignore_ascii_case(name)) {
        return CountryStatus::Replaced(*now);
    }
    match COUNTRIES.iter().find(|c| c.eq_ignore_ascii_case(name)) {
        Some(c) => CountryStatus::BadCapitalization(*c),
        None => CountryStatus::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatLonError {
    Format,
    LatitudeRange,
    LongitudeRange,
}

/// Parse `"46.5 N 20 E"` style values.
pub fn parse_lat_lon(value: &str) -> std::result::Result<LatLon, LatLonError> {
    let caps = LAT_LON.captures(value.trim()).ok_or(LatLonError::Format)?;
    let lat: f64 = caps[1].parse().map_err(|_| LatLonError::Format)?;
    let lon: f64 = caps[3].parse().map_err(|_| LatLonError::Format)?;
    if lat > 90.0 {
        return Err(LatLonError::LatitudeRange);
    }
    if lon > 180.0 {
        return Err(LatLonError::LongitudeRange);
    }
    Ok(LatLon {
        lat: if &caps[2] == "S" { -lat } else { lat },
        lon: if &caps[4] == "W" { -lon } else { lon },
    })
}

/// Maps coordinates to countries.
pub trait CountryLocator: Send + Sync {
    /// Country containing the point, if any.
    fn country_at(&self, point: LatLon) -> Option<String>;

    /// Distance in km from the point to the country's outline; `None` when
    /// the country has no outline.
    fn distance_km(&self, country: &str, point: LatLon) -> Option<f64>;
}

/// One country outline; points are `[lat, lon]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryShape {
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Deserialize)]
struct ShapeFile {
    countries: Vec<CountryShape>,
}

/// Coarse polygon outlines, tested in file order.
#[derive(Debug, Clone, Default)]
pub struct PolygonLocator {
    shapes: Vec<CountryShape>,
}

impl PolygonLocator {
    pub fn builtin() -> Self {
        // the embedded file is checked by the tests below
        Self::from_json(BUILTIN_SHAPES).unwrap_or_default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: ShapeFile = serde_json::from_str(text)?;
        Ok(Self { shapes: file.countries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ValidatorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|s| s.name.as_str())
    }
}

fn ring_contains(ring: &[[f64; 2]], point: LatLon) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let [yi, xi] = ring[i];
        let [yj, xj] = ring[j];
        if (yi > point.lat) != (yj > point.lat)
            && point.lon < (xj - xi) * (point.lat - yi) / (yj - yi) + xi
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from the point to a segment, in a local equirectangular
/// projection centred on the point.
fn segment_km(point: LatLon, a: [f64; 2], b: [f64; 2]) -> f64 {
    let scale = point.lat.to_radians().cos();
    let (ax, ay) = ((a[1] - point.lon) * scale * KM_PER_DEGREE, (a[0] - point.lat) * KM_PER_DEGREE);
    let (bx, by) = ((b[1] - point.lon) * scale * KM_PER_DEGREE, (b[0] - point.lat) * KM_PER_DEGREE);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0)
    };
    (ax + t * dx).hypot(ay + t * dy)
}

impl CountryLocator for PolygonLocator {
    fn country_at(&self, point: LatLon) -> Option<String> {
        self.shapes
            .iter()
            .find(|s| s.rings.iter().any(|r| ring_contains(r, point)))
            .map(|s| s.name.clone())
    }

    fn distance_km(&self, country: &str, point: LatLon) -> Option<f64> {
        let shape = self.shapes.iter().find(|s| s.name == country)?;
        if shape.rings.iter().any(|r| ring_contains(r, point)) {
            return Some(0.0);
        }
        shape
            .rings
            .iter()
            .flat_map(|ring| {
                (0..ring.len()).map(move |i| segment_km(point, ring[i], ring[(i + 1) % ring.len()]))
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}
