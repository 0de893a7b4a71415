use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Department {
    /// Short code used by clients, e.g. `HMT`.
    pub id: String,
    pub name: String,
    /// Brand colour as a CSS hex string.
    pub hex: String,
    /// gov.uk organisation slug; the feed lives at `{base_url}/{slug}.atom`.
    pub slug: String,
}

impl Department {
    pub fn new(id: &str, slug: &str, name: &str, hex: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hex: hex.to_string(),
            slug: slug.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("department catalog is empty")]
    Empty,
    #[error("duplicate department id: {0}")]
    DuplicateId(String),
}

/// The fixed set of departments served by the API, in response order.
#[derive(Debug, Clone)]
pub struct Catalog {
    departments: Vec<Department>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(departments: Vec<Department>) -> Result<Self, CatalogError> {
        if departments.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(departments.len());
        for (i, department) in departments.iter().enumerate() {
            if index.insert(department.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(department.id.clone()));
            }
        }

        Ok(Self { departments, index })
    }

    pub fn all(&self) -> &[Department] {
        &self.departments
    }

    pub fn lookup(&self, id: &str) -> Option<&Department> {
        self.index.get(id).map(|&i| &self.departments[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let departments = vec![
            Department::new("AGO", "attorney-generals-office", "Attorney General's Office", "#9f1888"),
            Department::new("CO", "cabinet-office", "Cabinet Office", "#005abb"),
            Department::new(
                "DBEIS",
                "department-for-business-energy-and-industrial-strategy",
                "Department for Business, Energy & Industrial Strategy",
                "#003479",
            ),
            Department::new(
                "DDCMS",
                "department-for-digital-culture-media-sport",
                "Department for Digital, Culture, Media & Sport",
                "#d40072",
            ),
            Department::new("DE", "department-for-education", "Department for Education", "#003a69"),
            Department::new(
                "DEFRA",
                "department-for-environment-food-rural-affairs",
                "Department for Environment, Food & Rural Affairs",
                "#00a33b",
            ),
            Department::new(
                "DID",
                "department-for-international-development",
                "Department for International Development",
                "#002878",
            ),
            Department::new(
                "DIT",
                "department-for-international-trade",
                "Department for International Trade",
                "#cf102d",
            ),
            Department::new("DT", "department-for-transport", "Department for Transport", "#006c56"),
            Department::new("DWP", "department-for-work-pensions", "Department for Work & Pensions", "#00beb7"),
            Department::new(
                "DHSC",
                "department-of-health-and-social-care",
                "Department for Health & Social Care",
                "#00ad93",
            ),
            Department::new("FCO", "foreign-commonwealth-office", "Foreign & Commonwealth Office", "#003e74"),
            Department::new("HMT", "hm-treasury", "HM Treasury", "#af292e"),
            Department::new("HO", "home-office", "Home Office", "#9325b2"),
            Department::new("MO", "ministry-of-defence", "Ministry of Defence", "#4d2942"),
            Department::new(
                "MHCLG",
                "ministry-of-housing-communities-and-local-government",
                "Ministry of Housing, Communities & Local Government",
                "#099",
            ),
            Department::new("MOJ", "ministry-of-justice", "Ministry of Justice", "#0b0c0c"),
            Department::new("NIO", "northern-ireland-office", "Northern Ireland Office", "#002663"),
            Department::new(
                "OAGS",
                "office-of-the-advocate-general-for-scotland",
                "Office of the Advocate General of Scotland",
                "#002663",
            ),
            Department::new(
                "OLHC",
                "the-office-of-the-leader-of-the-house-of-commons",
                "Office of the Leader of the House of Commons",
                "#317023",
            ),
            Department::new(
                "OLHL",
                "office-of-the-leader-of-the-house-of-lords",
                "Office of the Leader of the House of Lords",
                "#9c132e",
            ),
            Department::new(
                "OSSS",
                "office-of-the-secretary-of-state-for-scotland",
                "Office of the Secretary of State for Scotland",
                "#002663",
            ),
            Department::new(
                "OSSW",
                "office-of-the-secretary-of-state-for-wales",
                "Office of the Secretary of State for Wales",
                "#a33038",
            ),
            Department::new("UKEF", "uk-export-finance", "UK Export Finance", "#cf102d"),
        ];

        // the built-in table has unique ids, checked by the tests below
        let index = departments
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();

        Self { departments, index }
    }
}
