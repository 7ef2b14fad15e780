//! Citizen name generation

use rand::Rng;

/// Pick a random "Given Family" name
pub fn generate_name(rng: &mut impl Rng) -> String {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];
    format!("{given} {family}")
}

static GIVEN_NAMES: &[&str] = &[
    "Alda", "Bram", "Cora", "Dunstan", "Edda", "Finn", "Greta", "Hal", "Isolde", "Jory",
    "Kestrel", "Linnea", "Maren", "Nils", "Osric", "Pell", "Quill", "Rowan", "Sela", "Tamsin",
    "Ulric", "Vesna", "Wren", "Yara", "Ansel", "Brigid", "Cedric", "Daria", "Emrys", "Freya",
    "Gideon", "Hester", "Ivo", "Jessa", "Lorcan", "Mira", "Odo", "Piran", "Runa", "Soren",
];

static FAMILY_NAMES: &[&str] = &[
    "Ashdown", "Barley", "Cooper", "Dale", "Elmsworth", "Fletcher", "Greaves", "Hollow",
    "Ivybridge", "Juniper", "Kettle", "Longmead", "Miller", "Northway", "Oakes", "Pike",
    "Quarry", "Reed", "Stonebrook", "Thatcher", "Underhill", "Vale", "Wainwright", "Yew",
    "Brook", "Carter", "Fenwick", "Hartley", "Marsh", "Thorne",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_name() {
        let mut rng = StdRng::seed_from_u64(1);
        let name = generate_name(&mut rng);
        let mut parts = name.split(' ');
        assert!(GIVEN_NAMES.contains(&parts.next().unwrap()));
        assert!(FAMILY_NAMES.contains(&parts.next().unwrap()));
    }

    #[test]
    fn test_same_seed_same_names() {
        let a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..20).map(|_| generate_name(&mut rng)).collect()
        };
        let b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..20).map(|_| generate_name(&mut rng)).collect()
        };
        assert_eq!(a, b);

        let unique: std::collections::HashSet<_> = a.iter().collect();
        assert!(unique.len() > 10);
    }
}
