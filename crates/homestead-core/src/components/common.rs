//! Common components used across multiple entity types.

use serde::{Deserialize, Serialize};

/// 3D position vector. The ground plane is `x`/`z`; `y` is height.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the ground plane
    pub fn ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

/// World-space position of an entity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, z: f32) -> Self {
        Self(Vec3::ground(x, z))
    }
}

/// Selection flag, only ever changed by selection intents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selectable {
    pub selected: bool,
}

/// Serde adapters for `hecs::Entity` fields.
///
/// Entities are written as the `u64` from `Entity::to_bits`. Snapshot restore
/// recreates entities with the same bits, so references survive a round trip.
pub mod entity_bits {
    use hecs::Entity;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(entity: &Entity, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(entity.to_bits().get())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Entity, D::Error> {
        let bits = u64::deserialize(deserializer)?;
        Entity::from_bits(bits).ok_or_else(|| D::Error::custom(format!("invalid entity id {bits}")))
    }

    pub mod option {
        use hecs::Entity;
        use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            entity: &Option<Entity>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            entity.map(|e| e.to_bits().get()).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Entity>, D::Error> {
            match Option::<u64>::deserialize(deserializer)? {
                Some(bits) => Entity::from_bits(bits)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid entity id {bits}"))),
                None => Ok(None),
            }
        }
    }

    pub mod vec {
        use hecs::Entity;
        use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            entities: &[Entity],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            entities
                .iter()
                .map(|e| e.to_bits().get())
                .collect::<Vec<u64>>()
                .serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Entity>, D::Error> {
            Vec::<u64>::deserialize(deserializer)?
                .into_iter()
                .map(|bits| {
                    Entity::from_bits(bits)
                        .ok_or_else(|| D::Error::custom(format!("invalid entity id {bits}")))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 7.0);
        assert_eq!(sum.z, 9.0);

        let diff = b - a;
        assert_eq!(diff.x, 3.0);

        let scaled = a * 2.0;
        assert_eq!(scaled.x, 2.0);
        assert_eq!(scaled.y, 4.0);
    }

    #[test]
    fn test_vec3_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        let n = v.normalize();
        assert!((n.length() - 1.0).abs() < 0.001);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_position_is_on_ground() {
        let pos = Position::new(3.0, 4.0);
        assert_eq!(pos.0.y, 0.0);
        assert!((pos.0.distance(&Vec3::ZERO) - 5.0).abs() < 0.001);
    }
}
