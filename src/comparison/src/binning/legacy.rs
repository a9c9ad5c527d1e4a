//! The fixed product→class tables of the first-generation workflow.

use log::warn;

pub const LEGACY_CLASSES: [&str; 8] = [
    "PKSI",
    "PKSother",
    "NRPS",
    "RiPP",
    "saccharide",
    "terpene",
    "PKS-NRP_Hybrids",
    "other",
];

const PKS1_PRODUCTS: [&str; 2] = ["t1pks", "T1PKS"];

const PKSOTHER_PRODUCTS: [&str; 11] = [
    "transatpks",
    "t2pks",
    "t3pks",
    "otherks",
    "hglks",
    "transAT-PKS",
    "transAT-PKS-like",
    "T2PKS",
    "T3PKS",
    "PKS-like",
    "hglE-KS",
];

const NRPS_PRODUCTS: [&str; 5] = ["nrps", "NRPS", "NRPS-like", "thioamide-NRP", "NAPAA"];

const RIPPS_PRODUCTS: [&str; 33] = [
    "lantipeptide",
    "thiopeptide",
    "bacteriocin",
    "linaridin",
    "cyanobactin",
    "glycocin",
    "LAP",
    "lassopeptide",
    "sactipeptide",
    "bottromycin",
    "head_to_tail",
    "microcin",
    "microviridin",
    "proteusin",
    "lanthipeptide",
    "lipolanthine",
    "RaS-RiPP",
    "fungal-RiPP",
    "TfuA-related",
    "guanidinotides",
    "RiPP-like",
    "lanthipeptide-class-i",
    "lanthipeptide-class-ii",
    "lanthipeptide-class-iii",
    "lanthipeptide-class-iv",
    "lanthipeptide-class-v",
    "ranthipeptide",
    "redox-cofactor",
    "thioamitides",
    "epipeptide",
    "cyclic-lactone-autoinducer",
    "spliceotide",
    "RRE-containing",
];

const SACCHARIDE_PRODUCTS: [&str; 4] = [
    "amglyccycl",
    "oligosaccharide",
    "cf_saccharide",
    "saccharide",
];

const OTHERS_PRODUCTS: [&str; 31] = [
    "acyl_amino_acids",
    "arylpolyene",
    "aminocoumarin",
    "ectoine",
    "butyrolactone",
    "nucleoside",
    "melanin",
    "phosphoglycolipid",
    "phenazine",
    "phosphonate",
    "other",
    "cf_putative",
    "resorcinol",
    "indole",
    "ladderane",
    "PUFA",
    "furan",
    "hserlactone",
    "fused",
    "cf_fatty_acid",
    "siderophore",
    "blactam",
    "fatty_acid",
    "PpyS-KS",
    "CDPS",
    "betalactone",
    "PBDE",
    "tropodithietic-acid",
    "NAGGN",
    "halogenated",
    "pyrrolidine",
];

fn is_pks(product: &str) -> bool {
    PKS1_PRODUCTS.contains(&product) || PKSOTHER_PRODUCTS.contains(&product)
}

/// Sort a product annotation into its legacy class. Multi-product hybrids
/// ("a.b") resolve by set subtraction against the product families.
#[must_use]
pub fn legacy_get_class(product: &str) -> &'static str {
    if PKS1_PRODUCTS.contains(&product) {
        return "PKSI";
    }
    if PKSOTHER_PRODUCTS.contains(&product) {
        return "PKSother";
    }
    if NRPS_PRODUCTS.contains(&product) {
        return "NRPS";
    }
    if RIPPS_PRODUCTS.contains(&product) {
        return "RiPP";
    }
    if SACCHARIDE_PRODUCTS.contains(&product) {
        return "saccharide";
    }
    if product == "terpene" {
        return "terpene";
    }

    let subtypes: Vec<&str> = product.split('.').map(str::trim).collect();
    if subtypes.len() > 1 {
        if subtypes.iter().all(|sub| is_pks(sub) || NRPS_PRODUCTS.contains(sub)) {
            if subtypes.iter().all(|sub| NRPS_PRODUCTS.contains(sub)) {
                return "NRPS";
            }
            if subtypes.iter().all(|sub| is_pks(sub)) {
                return "PKSother";
            }
            return "PKS-NRP_Hybrids";
        }
        if subtypes.iter().all(|sub| RIPPS_PRODUCTS.contains(sub)) {
            return "RiPP";
        }
        if subtypes.iter().all(|sub| SACCHARIDE_PRODUCTS.contains(sub)) {
            return "saccharide";
        }
        return "other";
    }

    if OTHERS_PRODUCTS.contains(&product) {
        return "other";
    }
    if product.is_empty() {
        // no product annotation at all; possibly skipped by the annotation
        // pipeline.
        return "other";
    }

    warn!("unknown product {product}");
    "other"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_products() {
        assert_eq!(legacy_get_class("t1pks"), "PKSI");
        assert_eq!(legacy_get_class("T1PKS"), "PKSI");
        assert_eq!(legacy_get_class("transAT-PKS"), "PKSother");
        assert_eq!(legacy_get_class("NRPS-like"), "NRPS");
        assert_eq!(legacy_get_class("lassopeptide"), "RiPP");
        assert_eq!(legacy_get_class("oligosaccharide"), "saccharide");
        assert_eq!(legacy_get_class("terpene"), "terpene");
        assert_eq!(legacy_get_class("ectoine"), "other");
        assert_eq!(legacy_get_class(""), "other");
        assert_eq!(legacy_get_class("never-seen-before"), "other");
    }

    #[test]
    fn hybrid_products() {
        assert_eq!(legacy_get_class("t1pks.nrps"), "PKS-NRP_Hybrids");
        assert_eq!(legacy_get_class("t1pks.t2pks"), "PKSother");
        assert_eq!(legacy_get_class("nrps.NRPS-like"), "NRPS");
        assert_eq!(legacy_get_class("lantipeptide.thiopeptide"), "RiPP");
        assert_eq!(legacy_get_class("saccharide.oligosaccharide"), "saccharide");
        assert_eq!(legacy_get_class("t1pks.terpene"), "other");
    }
}
