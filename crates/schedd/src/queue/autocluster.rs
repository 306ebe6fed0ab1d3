use negotiation::classad::Ad;
use negotiation::{AutoClusterId, Map};

pub const DEFAULT_SIGNIFICANT_ATTRIBUTES: [&str; 4] =
    ["JobUniverse", "RequestCpus", "RequestMemory", "RequestDisk"];

/// Groups jobs into equivalence classes by the values of their significant attributes.
///
/// Two jobs land in the same auto-cluster iff every significant attribute has the same
/// value in both (a missing attribute compares equal to another missing attribute).
pub struct AutoClusters {
    significant_attributes: Vec<String>,
    signatures: Map<String, AutoClusterId>,
    next_id: i32,
}

impl AutoClusters {
    pub fn new(significant_attributes: Vec<String>) -> Self {
        let significant_attributes = if significant_attributes.is_empty() {
            DEFAULT_SIGNIFICANT_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            significant_attributes
        };
        AutoClusters {
            significant_attributes,
            signatures: Default::default(),
            next_id: 1,
        }
    }

    pub fn significant_attributes(&self) -> &[String] {
        &self.significant_attributes
    }

    /// Value of the `AutoClusterAttrs` attribute.
    pub fn significant_attributes_list(&self) -> String {
        self.significant_attributes.join(",")
    }

    fn signature(&self, ad: &Ad) -> String {
        let mut signature = String::new();
        for name in &self.significant_attributes {
            match ad.lookup(name) {
                Some(value) => signature.push_str(&value.to_string()),
                None => signature.push_str("undefined"),
            }
            signature.push('\n');
        }
        signature
    }

    pub fn get_auto_cluster_id(&mut self, ad: &Ad) -> AutoClusterId {
        let signature = self.signature(ad);
        if let Some(id) = self.signatures.get(&signature) {
            return *id;
        }
        let id = AutoClusterId::new(self.next_id);
        self.next_id += 1;
        log::debug!("New auto cluster {id}");
        self.signatures.insert(signature, id);
        id
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
