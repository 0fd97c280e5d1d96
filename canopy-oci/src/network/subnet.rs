use std::collections::HashMap;

use canopy_core::context::{ResourceHandle, Stack};
use canopy_core::resource::{Resource, Value};
use log::info;

use super::NetworkBuilder;
use crate::config::SubnetConfig;
use crate::error::{InfraError, InfraResult};
use crate::resources;

impl NetworkBuilder<'_> {
    /// Register the subnet at `index` with the given security lists attached.
    /// An empty `security_list_ids` leaves the attachment unset.
    pub fn create_subnet(
        &self,
        ctx: Option<&mut Stack>,
        index: usize,
        vcn_id: &Value,
        security_list_ids: &[Value],
    ) -> InfraResult<ResourceHandle> {
        let stack = ctx.ok_or(InfraError::NilContext)?;
        let subnet = self.subnet_at(index)?;

        let attachment = (!security_list_ids.is_empty()).then(|| Value::List(security_list_ids.to_vec()));
        let resource = Resource::new(resources::SUBNET, &subnet.name)
            .with_attribute("compartment_id", self.compartment_id())
            .with_attribute("vcn_id", vcn_id.clone())
            .with_attribute("cidr_block", Value::string(&subnet.cidr_block))
            .with_attribute("display_name", Value::string(&subnet.name))
            .with_optional_attribute("security_list_ids", attachment);

        let handle = stack
            .register(resource)
            .map_err(|e| InfraError::provider(&subnet.name, e))?;
        info!(
            "Subnet {} ({}) with {} security list(s)",
            subnet.name,
            subnet.cidr_block,
            security_list_ids.len()
        );
        Ok(handle)
    }

    /// Register every subnet with the same security lists attached
    pub fn create_all_subnets(
        &self,
        stack: &mut Stack,
        vcn_id: &Value,
        security_list_ids: &[Value],
    ) -> InfraResult<Vec<ResourceHandle>> {
        let mut handles = Vec::with_capacity(self.config.subnets.len());
        for (i, subnet) in self.config.subnets.iter().enumerate() {
            let handle = self
                .create_subnet(Some(&mut *stack), i, vcn_id, security_list_ids)
                .map_err(|e| InfraError::wrap("subnet", &subnet.name, e))?;
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Register the subnet at `index` with the security lists tagged for it
    pub fn create_subnet_with_security_lists(
        &self,
        ctx: Option<&mut Stack>,
        index: usize,
        vcn_id: &Value,
        security_lists: &HashMap<String, ResourceHandle>,
    ) -> InfraResult<ResourceHandle> {
        let stack = ctx.ok_or(InfraError::NilContext)?;
        let subnet = self.subnet_at(index)?;
        let ids = self.resolve_security_list_ids(&subnet.name, security_lists);
        self.create_subnet(Some(stack), index, vcn_id, &ids)
    }

    /// Register every subnet, each with the security lists tagged for it
    pub fn create_all_subnets_with_security_lists(
        &self,
        stack: &mut Stack,
        vcn_id: &Value,
        security_lists: &HashMap<String, ResourceHandle>,
    ) -> InfraResult<Vec<ResourceHandle>> {
        let mut handles = Vec::with_capacity(self.config.subnets.len());
        for (i, subnet) in self.config.subnets.iter().enumerate() {
            let handle = self
                .create_subnet_with_security_lists(Some(&mut *stack), i, vcn_id, security_lists)
                .map_err(|e| InfraError::wrap("subnet", &subnet.name, e))?;
            handles.push(handle);
        }
        Ok(handles)
    }

    fn subnet_at(&self, index: usize) -> InfraResult<&SubnetConfig> {
        self.config
            .subnets
            .get(index)
            .ok_or(InfraError::IndexOutOfRange {
                kind: "subnet",
                index,
                len: self.config.subnets.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{network, subnet};
    use super::*;
    use crate::config::NetworkConfig;
    use crate::oci_stack;

    fn vcn_ref() -> Value {
        Value::ResourceRef("core.vcn.dev-vcn".to_string(), "id".to_string())
    }

    #[test]
    fn create_subnet_sets_cidr_and_attachment() {
        let config = network();
        let mut stack = oci_stack("test");
        let ids = vec![Value::string("ocid1.securitylist.oc1..a")];

        let handle = NetworkBuilder::new(&config)
            .create_subnet(Some(&mut stack), 1, &vcn_ref(), &ids)
            .unwrap();

        assert_eq!(handle.name(), "private-subnet");
        let resource = stack.resources().next().unwrap();
        assert_eq!(resource.get("cidr_block"), Some(&Value::string("10.0.2.0/24")));
        assert_eq!(resource.get("vcn_id"), Some(&vcn_ref()));
        assert_eq!(resource.get("security_list_ids"), Some(&Value::List(ids)));
    }

    #[test]
    fn no_security_lists_leaves_attachment_unset() {
        let config = network();
        let mut stack = oci_stack("test");

        NetworkBuilder::new(&config)
            .create_subnet(Some(&mut stack), 0, &vcn_ref(), &[])
            .unwrap();

        assert!(stack.resources().next().unwrap().get("security_list_ids").is_none());
    }

    #[test]
    fn missing_context_is_rejected() {
        let config = network();
        let err = NetworkBuilder::new(&config)
            .create_subnet(None, 0, &vcn_ref(), &[])
            .unwrap_err();
        assert!(matches!(err, InfraError::NilContext));
    }

    #[test]
    fn index_out_of_range() {
        let config = network();
        let mut stack = oci_stack("test");
        let builder = NetworkBuilder::new(&config);

        for index in [2, 100] {
            let err = builder
                .create_subnet(Some(&mut stack), index, &vcn_ref(), &[])
                .unwrap_err();
            assert!(matches!(
                err,
                InfraError::IndexOutOfRange { kind: "subnet", len: 2, .. }
            ));
        }
        assert!(stack.plan().is_empty());
    }

    #[test]
    fn create_all_uses_same_ids() {
        let config = network();
        let mut stack = oci_stack("test");
        let ids = vec![Value::string("ocid1.securitylist.oc1..shared")];

        let handles = NetworkBuilder::new(&config)
            .create_all_subnets(&mut stack, &vcn_ref(), &ids)
            .unwrap();

        assert_eq!(handles.len(), 2);
        assert!(
            stack
                .resources()
                .all(|r| r.get("security_list_ids") == Some(&Value::List(ids.clone())))
        );
    }

    #[test]
    fn subnets_get_their_tagged_lists() {
        let config = network();
        let builder = NetworkBuilder::new(&config);
        let mut stack = oci_stack("test");
        let lists = builder.create_security_list_map(&mut stack, &vcn_ref()).unwrap();

        let handles = builder
            .create_all_subnets_with_security_lists(&mut stack, &vcn_ref(), &lists)
            .unwrap();
        assert_eq!(handles.len(), 2);

        let public = stack.plan().find(handles[0].id()).unwrap().resource();
        assert_eq!(
            public.get("security_list_ids"),
            Some(&Value::List(vec![
                lists["public-ssh"].id_ref(),
                lists["public-http"].id_ref(),
            ]))
        );

        let private = stack.plan().find(handles[1].id()).unwrap().resource();
        assert_eq!(
            private.get("security_list_ids"),
            Some(&Value::List(vec![lists["private-ssh"].id_ref()]))
        );
    }

    #[test]
    fn failure_is_wrapped_with_subnet_name() {
        let config = NetworkConfig {
            subnets: vec![subnet("ok", "10.0.1.0/24"), subnet("broken", "10.0.2.0")],
            ..network()
        };
        let mut stack = oci_stack("test");

        let err = NetworkBuilder::new(&config)
            .create_all_subnets_with_security_lists(&mut stack, &vcn_ref(), &HashMap::new())
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to create subnet broken:"));
        assert!(matches!(err.root(), InfraError::Provider { .. }));
    }
}
