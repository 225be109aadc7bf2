//! Per-kind column mapping.
//!
//! Each mapper pulls the kind-specific columns out of a row and builds a
//! fully typed record. Dispatch is a plain match on the kind: adding a kind
//! means adding an arm here, a name column and an address column.

use pharma_registry_core::{
    AgeBracket, Agency, Depot, EstablishmentKind, ManufacturingSite, Pharmacy, PharmacyStatus,
    Sex, SiteProfile, Wholesaler,
};

use crate::tabular::RowMap;
use crate::{fields, ImportResult};

/// A record built from one row, ready for create-or-update.
pub(crate) enum ImportedRecord {
    Pharmacy(Pharmacy),
    Depot(Depot),
    Wholesaler(Wholesaler),
    Agency(Agency),
    ManufacturingSite(ManufacturingSite),
}

/// Column carrying the record name, per kind (exact legacy headers).
pub(crate) fn name_column(kind: EstablishmentKind) -> &'static str {
    match kind {
        EstablishmentKind::Pharmacy => "NOM DE L'OFFICINE",
        EstablishmentKind::Depot => "NOM DU DEPOT",
        EstablishmentKind::Wholesaler => "NOM GROSSISTE REPARTITEUR",
        EstablishmentKind::Agency => "NOM DE L'AGENCE DE PROMOTION",
        EstablishmentKind::ManufacturingSite => "NOM DE L'ETABLISSEMENT",
    }
}

/// Column carrying the street address, per kind. The doubled spaces are
/// verbatim from the legacy export templates.
pub(crate) fn address_column(kind: EstablishmentKind) -> &'static str {
    match kind {
        EstablishmentKind::Pharmacy => "ADRESSE  EXACTE DE L'OFFICINE",
        EstablishmentKind::Depot => "ADRESSE  EXACTE DU DEPOT",
        EstablishmentKind::Wholesaler
        | EstablishmentKind::Agency
        | EstablishmentKind::ManufacturingSite => "ADRESSE  EXACTE",
    }
}

/// Build the typed record for a row.
pub(crate) fn build_record(
    kind: EstablishmentKind,
    row: &RowMap,
    name: String,
    profile: SiteProfile,
) -> ImportResult<ImportedRecord> {
    match kind {
        EstablishmentKind::Pharmacy => pharmacy(row, name, profile).map(ImportedRecord::Pharmacy),
        EstablishmentKind::Depot => depot(row, name, profile).map(ImportedRecord::Depot),
        EstablishmentKind::Wholesaler => {
            wholesaler(row, name, profile).map(ImportedRecord::Wholesaler)
        }
        EstablishmentKind::Agency => agency(row, name, profile).map(ImportedRecord::Agency),
        EstablishmentKind::ManufacturingSite => {
            manufacturing(row, name, profile).map(ImportedRecord::ManufacturingSite)
        }
    }
}

fn pharmacy(row: &RowMap, name: String, profile: SiteProfile) -> ImportResult<Pharmacy> {
    let mut record = Pharmacy::new(
        name,
        profile,
        fields::required_text(row, "NUMERO TELEPHONE")?,
        fields::required_year(row, "ANNEE CREATION")?,
        operating_year(row)?,
        fields::required_text(row, "PRENOM ET NOM TITULAIRE/PHARMACIEN RESPONSABLE")?,
        fields::required_text(row, "NUMERO D'INSCRIPTION ORDRE DES PHARMACIEN")?,
    );
    record.status = row
        .get("STATUT (TRANSFERT-RACHAT)")
        .map(PharmacyStatus::from_raw);
    record.owner_sex = row.get("SEXE").map(Sex::from_raw).unwrap_or(Sex::Unspecified);
    record.owner_age_bracket = row
        .get("TRANCHE D'AGE")
        .map(AgeBracket::from_raw)
        .unwrap_or(AgeBracket::Unspecified);
    record.assistant_count = Some(fields::required_count(row, "NOMBRE D'ASSISTANTS")?);
    record.pharmacist_staff = Some(fields::required_count(row, "NOMBRE D'EMPLOYE PHARMACIEN")?);
    record.non_pharmacist_staff = Some(fields::required_count(
        row,
        "NOMBRE D'EMPLOYE NON PHARMACIEN",
    )?);
    record.security_staff = Some(fields::required_count(row, "NOMBRE D'AGENT DE SECURITE")?);
    record.hygiene_staff = Some(fields::required_count(row, "NOMBRE D'AGENT D'HYGIENE")?);
    record.revenue = fields::money(row, "CHIFFRE D'AFFAIRE");
    record.vehicle_count =
        fields::optional_count(row, "NOMBRE DE VEHICULE(LIVRAISON ET TRANSFERT)");
    Ok(record)
}

/// The legacy pharmacy template triple-spaces this header; later exports
/// collapsed it. Accept both.
fn operating_year(row: &RowMap) -> ImportResult<i32> {
    let value = row
        .get("ANNEE   D'EXPLOITATION")
        .or_else(|| row.get("ANNEE D'EXPLOITATION"));
    fields::parse_required_year(row.line(), "ANNEE D'EXPLOITATION", value)
}

fn depot(row: &RowMap, name: String, profile: SiteProfile) -> ImportResult<Depot> {
    let mut record = Depot::new(
        name,
        profile,
        fields::required_text(row, "NUMERO TELEPHONE")?,
        fields::required_year(row, "ANNEE D'OUVERTURE")?,
        fields::required_text(row, "PRENOM ET NOM RESPONSABLE/DEPOSITAIRE")?,
    );
    record.manager_sex = row.get("SEXE").map(Sex::from_raw).unwrap_or(Sex::Unspecified);
    Ok(record)
}

fn wholesaler(row: &RowMap, name: String, profile: SiteProfile) -> ImportResult<Wholesaler> {
    let mut record = Wholesaler::new(
        name,
        profile,
        fields::required_text(row, "NUMERO TELEPHONE")?,
        fields::required_year(row, "ANNEE D'OUVERTURE")?,
        fields::required_text(row, "PRENOM ET NOM RESPONSABLE/DIRECTEUR")?,
    );
    record.pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE PHARMACIEN")?;
    record.non_pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE NON PHARMACIEN")?;
    record.security_staff = fields::required_count(row, "NOMBRE D'AGENT DE SECURITE")?;
    record.hygiene_staff = fields::required_count(row, "NOMBRE D'AGENT D'HYGIENE")?;
    record.revenue = fields::money(row, "CHIFFRE D'AFFAIRE");
    record.vehicle_count =
        fields::optional_count(row, "NOMBRE DE VEHICULE(LIVRAISON ET TRANSFERT)");
    Ok(record)
}

fn agency(row: &RowMap, name: String, profile: SiteProfile) -> ImportResult<Agency> {
    let mut record = Agency::new(
        name,
        profile,
        fields::required_text(row, "NUMERO TELEPHONE")?,
        fields::required_year(row, "ANNEE D'OUVERTURE")?,
        fields::required_text(row, "NUMERO DE L'AGREMENT")?,
        fields::required_date(row, "DATE DE L'AGREMENT")?,
        fields::required_text(row, "PRENOM ET NOM  DU PHARMACIEN RESPONSABLE")?,
    );
    record.pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE PHARMACIEN")?;
    record.non_pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE NON PHARMACIEN")?;
    record.revenue = fields::money(row, "CHIFFRE D'AFFAIRE");
    record.represented_laboratory = fields::optional_text(row, "NOM DU LABORATOIRE REPRESENTE");
    Ok(record)
}

fn manufacturing(
    row: &RowMap,
    name: String,
    profile: SiteProfile,
) -> ImportResult<ManufacturingSite> {
    let mut record = ManufacturingSite::new(
        name,
        profile,
        fields::required_text(row, "NUMERO TELEPHONE")?,
        fields::required_year(row, "ANNEE D'OUVERTURE")?,
        fields::required_text(row, "PRENOM ET NOM RESPONSABLE")?,
    );
    record.pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE PHARMACIEN")?;
    record.non_pharmacist_staff = fields::required_count(row, "NOMBRE D'EMPLOYE NON PHARMACIEN")?;
    record.security_staff = fields::required_count(row, "NOMBRE D'AGENT DE SECURITE")?;
    record.hygiene_staff = fields::required_count(row, "NOMBRE D'AGENT D'HYGIENE")?;
    record.revenue = fields::money(row, "CHIFFRE D'AFFAIRE");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::read_rows;

    fn profile() -> SiteProfile {
        SiteProfile::new(1, 1, 1, "Plateau".into(), "12 Rue Carnot".into())
    }

    fn row_from(csv: &str) -> RowMap {
        read_rows(csv.as_bytes(), "test.csv").unwrap().remove(0)
    }

    #[test]
    fn test_pharmacy_mapper_coerces_vocabularies() {
        let row = row_from(
            "NUMERO TELEPHONE,ANNEE CREATION,ANNEE D'EXPLOITATION,\
             STATUT (TRANSFERT-RACHAT),PRENOM ET NOM TITULAIRE/PHARMACIEN RESPONSABLE,\
             NUMERO D'INSCRIPTION ORDRE DES PHARMACIEN,SEXE,TRANCHE D'AGE,\
             NOMBRE D'ASSISTANTS,NOMBRE D'EMPLOYE PHARMACIEN,NOMBRE D'EMPLOYE NON PHARMACIEN,\
             NOMBRE D'AGENT DE SECURITE,NOMBRE D'AGENT D'HYGIENE,CHIFFRE D'AFFAIRE,\
             NOMBRE DE VEHICULE(LIVRAISON ET TRANSFERT)\n\
             +221 33 821 00 00,1998,1999,Transfert,Awa Ndiaye,ORD-4521,Féminin,40 - 49 ans,\
             2,1,3,1,1,45000000,2\n",
        );
        let record = pharmacy(&row, "Pharmacie du Plateau".into(), profile()).unwrap();

        assert_eq!(record.founding_year, 1998);
        assert_eq!(record.operating_year, 1999);
        assert_eq!(record.status, Some(PharmacyStatus::Transfer));
        assert_eq!(record.owner_sex, Sex::Feminine);
        assert_eq!(record.owner_age_bracket, AgeBracket::From40To49);
        assert_eq!(record.assistant_count, Some(2));
        assert_eq!(record.revenue, 45_000_000.0);
        assert_eq!(record.vehicle_count, Some(2));
    }

    #[test]
    fn test_pharmacy_accepts_triple_spaced_year_header() {
        let row = row_from(
            "NUMERO TELEPHONE,ANNEE CREATION,ANNEE   D'EXPLOITATION,\
             PRENOM ET NOM TITULAIRE/PHARMACIEN RESPONSABLE,\
             NUMERO D'INSCRIPTION ORDRE DES PHARMACIEN,NOMBRE D'ASSISTANTS,\
             NOMBRE D'EMPLOYE PHARMACIEN,NOMBRE D'EMPLOYE NON PHARMACIEN,\
             NOMBRE D'AGENT DE SECURITE,NOMBRE D'AGENT D'HYGIENE\n\
             +221 33 821 00 00,1998,2001,Awa Ndiaye,ORD-4521,0,0,0,0,0\n",
        );
        let record = pharmacy(&row, "Pharmacie du Plateau".into(), profile()).unwrap();
        assert_eq!(record.operating_year, 2001);
    }

    #[test]
    fn test_depot_mapper_defaults_sex() {
        let row = row_from(
            "NUMERO TELEPHONE,ANNEE D'OUVERTURE,PRENOM ET NOM RESPONSABLE/DEPOSITAIRE\n\
             +221 77 511 22 33,2015,Moussa Sow\n",
        );
        let record = depot(&row, "Dépôt de Soum".into(), profile()).unwrap();
        assert_eq!(record.manager_sex, Sex::Unspecified);
        assert_eq!(record.opening_year, 2015);
    }

    #[test]
    fn test_wholesaler_requires_staff_counts() {
        let row = row_from(
            "NUMERO TELEPHONE,ANNEE D'OUVERTURE,PRENOM ET NOM RESPONSABLE/DIRECTEUR\n\
             +221 33 836 00 00,2002,Cheikh Ba\n",
        );
        let err = wholesaler(&row, "Sodipharm".into(), profile()).unwrap_err();
        assert!(err.to_string().contains("NOMBRE D'EMPLOYE PHARMACIEN"));
    }

    #[test]
    fn test_agency_mapper_parses_license_date() {
        let row = row_from(
            "NUMERO TELEPHONE,ANNEE D'OUVERTURE,NUMERO DE L'AGREMENT,DATE DE L'AGREMENT,\
             PRENOM ET NOM  DU PHARMACIEN RESPONSABLE,NOMBRE D'EMPLOYE PHARMACIEN,\
             NOMBRE D'EMPLOYE NON PHARMACIEN\n\
             +221 33 842 10 10,2018,AGR-2018-054,12/03/2018,Fatou Sarr,2,6\n",
        );
        let record = agency(&row, "Promo Santé".into(), profile()).unwrap();
        assert_eq!(
            record.license_date,
            chrono::NaiveDate::from_ymd_opt(2018, 3, 12).unwrap()
        );
        assert_eq!(record.license_number, "AGR-2018-054");
    }
}
