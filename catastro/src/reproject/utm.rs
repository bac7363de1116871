//! Projection UTM par les séries de Krüger (ordre 6)
//!
//! Précision sub-millimétrique dans la zone, ce qui permet l'aller-retour
//! projeté → géographique → projeté au centimètre.

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Facteur d'échelle sur le méridien central
const K0: f64 = 0.9996;

/// Fausse abscisse
const FALSE_EASTING: f64 = 500_000.0;

/// Fausse ordonnée de l'hémisphère sud
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Méridien central d'une zone (radians)
pub fn central_meridian(zone: u32) -> f64 {
    (f64::from(zone) * 6.0 - 183.0).to_radians()
}

/// Coefficients de la série pour un ellipsoïde donné
struct Series {
    /// Rayon rectifiant A
    a: f64,
    e: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl Series {
    fn new(ellipsoid: &Ellipsoid) -> Self {
        let n = ellipsoid.n();
        let (n2, n3, n4, n5, n6) = (n * n, n.powi(3), n.powi(4), n.powi(5), n.powi(6));

        let a = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ];

        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];

        Self {
            a,
            e: ellipsoid.e(),
            alpha,
            beta,
        }
    }

    /// σ = sinh(e · atanh(e·τ / √(1+τ²)))
    fn sigma(&self, tau: f64) -> f64 {
        (self.e * (self.e * tau / (1.0 + tau * tau).sqrt()).atanh()).sinh()
    }

    /// Latitude conforme: τ' en fonction de τ
    fn conformal_tau(&self, tau: f64) -> f64 {
        let sigma = self.sigma(tau);
        tau * (1.0 + sigma * sigma).sqrt() - sigma * (1.0 + tau * tau).sqrt()
    }
}

/// Coordonnées géographiques vers UTM (x, y en mètres)
pub fn geographic_to_utm(geo: Geographic, zone: u32, south: bool, ellipsoid: &Ellipsoid) -> (f64, f64) {
    let s = Series::new(ellipsoid);
    let lambda = geo.lon - central_meridian(zone);

    let tau = geo.lat.tan();
    let tau_p = s.conformal_tau(tau);

    let xi_p = tau_p.atan2(lambda.cos());
    let eta_p = (lambda.sin() / (tau_p * tau_p + lambda.cos().powi(2)).sqrt()).asinh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    let x = K0 * s.a * eta + FALSE_EASTING;
    let mut y = K0 * s.a * xi;
    if south {
        y += FALSE_NORTHING_SOUTH;
    }
    (x, y)
}

/// UTM vers coordonnées géographiques
pub fn utm_to_geographic(x: f64, y: f64, zone: u32, south: bool, ellipsoid: &Ellipsoid) -> Geographic {
    let s = Series::new(ellipsoid);

    let x = x - FALSE_EASTING;
    let y = if south { y - FALSE_NORTHING_SOUTH } else { y };

    let eta = x / (K0 * s.a);
    let xi = y / (K0 * s.a);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in s.beta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let sinh_eta_p = eta_p.sinh();
    let sin_xi_p = xi_p.sin();
    let cos_xi_p = xi_p.cos();

    let tau_p = sin_xi_p / (sinh_eta_p * sinh_eta_p + cos_xi_p * cos_xi_p).sqrt();

    // Newton sur τ (converge en 2 à 3 itérations)
    let e2 = s.e * s.e;
    let mut tau = tau_p;
    for _ in 0..10 {
        let tau_i_p = s.conformal_tau(tau);
        let delta = (tau_p - tau_i_p) / (1.0 + tau_i_p * tau_i_p).sqrt()
            * (1.0 + (1.0 - e2) * tau * tau)
            / ((1.0 - e2) * (1.0 + tau * tau).sqrt());
        tau += delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }

    let lat = tau.atan();
    let lon = sinh_eta_p.atan2(cos_xi_p) + central_meridian(zone);

    Geographic::new(lon, lat)
}
