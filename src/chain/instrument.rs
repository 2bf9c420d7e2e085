/// Lien, release and encumbrance labels. Checked before the vesting list so
/// that "DEED OF TRUST" never reaches the generic "DEED" rule.
const NON_VESTING: [&str; 12] = [
    "DEED OF TRUST",
    "MORTGAGE",
    "UCC",
    "ASSIGNMENT",
    "SATISFACTION",
    "RELEASE",
    "SUBORDINATION",
    "MODIFICATION",
    "LIS PENDENS",
    "AFFIDAVIT",
    "EASEMENT",
    "RIGHT OF WAY",
];

const VESTING: [&str; 3] = ["WARRANTY DEED", "QUITCLAIM DEED", "DEED"];

/// Whether an instrument label transfers ownership.
pub fn is_vesting_deed(instrument: &str) -> bool {
    let label = instrument.trim().to_uppercase();
    if label.is_empty() {
        return false;
    }

    if NON_VESTING.iter().any(|needle| label.contains(needle)) {
        return false;
    }

    VESTING.iter().any(|needle| label.contains(needle))
}
