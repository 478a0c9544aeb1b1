use num_traits::Float;

/// Returns the up/down angle (in radians) from an eye at `eye_elev`
/// to terrain at `terrain_elev` lying `distance` away horizontally.
pub fn elevation_angle<T>(eye_elev: T, distance: T, terrain_elev: T) -> T
where
    T: Float,
{
    (terrain_elev - eye_elev).atan2(distance)
}

/// Returns how far terrain `distance` away sits below the eye's
/// horizontal plane due to earth curvature, reduced by atmospheric
/// `refraction`.
pub fn curvature_drop<T>(distance: T, refraction: T, earth_radius: T) -> T
where
    T: Float,
{
    let two = T::one() + T::one();
    distance.powi(2) * (T::one() - refraction) / (two * earth_radius)
}
