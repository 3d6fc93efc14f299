use serde::{Deserialize, Serialize};

use super::enums::HospitalTier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * Self::EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub address: String,
    pub municipality: String,
    pub phone: String,
    pub coordinates: Coordinates,
    pub services: Vec<String>,
    pub tier: HospitalTier,
}

impl Hospital {
    pub fn offers(&self, specialty: &str) -> bool {
        self.services.iter().any(|s| s == specialty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub hospital_id: String,
    pub available: bool,
    pub schedule: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let managua = Coordinates { lat: 12.1364, lng: -86.2514 };
        assert!(managua.distance_km(&managua) < 1e-9);
    }

    #[test]
    fn managua_to_leon_is_roughly_eighty_km() {
        let managua = Coordinates { lat: 12.1364, lng: -86.2514 };
        let leon = Coordinates { lat: 12.4379, lng: -86.8780 };
        let d = managua.distance_km(&leon);
        assert!((70.0..85.0).contains(&d), "got {d}");
    }
}
