use serde::{Deserialize, Serialize};

/// Market segment sent with every upstream plan query
pub const INDIVIDUAL_MARKET: &str = "Individual";

/// A county record returned by the ZIP lookup, reduced to the two fields we use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyCandidate {
    pub state: Option<String>,
    pub fips: Option<String>,
}

/// Plan summary normalized from the upstream search payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPlan {
    pub plan_id: Option<String>,
    pub plan_name: Option<String>,
    pub issuer_name: Option<String>,
    pub metal_level: Option<String>,
    pub monthly_premium: Option<f64>,
    pub deductible: Option<f64>,
    pub out_of_pocket_max: Option<f64>,
    pub network_type: Option<String>,
}

impl NormalizedPlan {
    /// Whether this plan should be looked up in the bulk detail endpoint
    pub fn needs_enrichment(&self) -> bool {
        self.plan_id.is_some() && (self.deductible.is_none() || self.out_of_pocket_max.is_none())
    }
}

/// One member of the household being priced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Person {
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aptc_eligible: Option<bool>,
    pub uses_tobacco: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Household {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    pub people: Vec<Person>,
}

impl Household {
    /// Household for the plan search call: every member is APTC eligible
    pub fn for_search(ages: &[u32], income: Option<f64>) -> Self {
        Self::build(ages, income, Some(true))
    }

    /// Household for the bulk detail call, which takes no APTC flag
    pub fn for_details(ages: &[u32], income: Option<f64>) -> Self {
        Self::build(ages, income, None)
    }

    fn build(ages: &[u32], income: Option<f64>, aptc_eligible: Option<bool>) -> Self {
        Self {
            income,
            people: ages
                .iter()
                .map(|&age| Person { age, aptc_eligible, uses_tobacco: false })
                .collect(),
        }
    }
}

/// Where the household lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    pub countyfips: String,
    pub state: String,
    pub zipcode: String,
}

/// Body of `POST /api/v1/plans/search`
#[derive(Debug, Clone, Serialize)]
pub struct PlanSearchBody {
    pub household: Household,
    pub market: &'static str,
    pub place: Place,
    pub year: i32,
}

/// Body of the bulk `POST /api/v1/plans` detail call
#[derive(Debug, Clone, Serialize)]
pub struct PlanDetailsBody {
    pub household: Household,
    pub place: Place,
    pub market: &'static str,
    pub plan_ids: Vec<String>,
    pub year: i32,
}
