use crate::{Issues, ResolveIssue};
use assets_rigbake::Material;
use indexmap::IndexMap;
use scene_rigbake::{NodeId, Scene, SourceMaterial};

/// Base file name without directory or extension. Both separators are accepted
#[must_use]
pub fn texture_stem(path: &str) -> &str
{
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rfind('.')
    {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    }
}

/// Materials by source name, in first-seen order. Scoped to one scene
#[derive(Debug, Default, Clone)]
pub struct MaterialTable
{
    by_name: IndexMap<String, Material>,
}
impl MaterialTable
{
    pub fn insert(&mut self, source: &SourceMaterial) -> u32
    {
        let entry = self.by_name.entry(source.name.clone());
        let index = entry.index();
        entry.or_insert_with(|| Material
        {
            name: source.name.clone(),
            diffuse_texture_name: source.diffuse_texture.as_deref().map(texture_stem).unwrap_or_default().to_string(),
            normal_texture_name: source.normal_texture.as_deref().map(texture_stem).unwrap_or_default().to_string(),
        });
        index as u32
    }

    #[inline] #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> { self.by_name.get_index_of(name).map(|i| i as u32) }
    #[inline] #[must_use]
    pub fn len(&self) -> usize { self.by_name.len() }
    #[inline] #[must_use]
    pub fn is_empty(&self) -> bool { self.by_name.is_empty() }

    /// Material index of a node's sub-mesh: its first slot, else 0
    #[must_use]
    pub fn submesh_material(&self, scene: &Scene, node: NodeId) -> u32
    {
        scene.node(node).materials.first()
            .and_then(|id| scene.material(*id))
            .and_then(|m| self.get(&m.name))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn into_materials(self) -> Vec<Material>
    {
        self.by_name.into_values().collect()
    }
}

/// Every material slot of every node, depth first
pub fn collect_materials(scene: &Scene, issues: &mut Issues) -> MaterialTable
{
    let mut table = MaterialTable::default();
    for node in scene.depth_first()
    {
        let scene_node = scene.node(node);
        for (slot, id) in scene_node.materials.iter().enumerate()
        {
            match scene.material(*id)
            {
                Some(source) => { table.insert(source); }
                None => issues.push(ResolveIssue::UnknownMaterial { node: scene_node.name.clone(), slot }),
            }
        }
    }

    log::debug!("Materials: {:?}", table.by_name.keys().collect::<Vec<_>>());
    table
}

#[cfg(test)]
mod tests
{
    use scene_rigbake::{LocalTransform, MaterialId, NodeAttribute};
    use super::*;

    #[test]
    fn stems()
    {
        assert_eq!(texture_stem("textures/skin_d.png"), "skin_d");
        assert_eq!(texture_stem("C:\\art\\hero\\hero.normal.tga"), "hero.normal");
        assert_eq!(texture_stem("plain"), "plain");
        assert_eq!(texture_stem("dir/.hidden"), ".hidden");
        assert_eq!(texture_stem(""), "");
    }

    fn material(name: &str, diffuse: Option<&str>) -> SourceMaterial
    {
        SourceMaterial
        {
            name: name.to_string(),
            diffuse_texture: diffuse.map(str::to_string),
            normal_texture: None,
        }
    }

    #[test]
    fn dedup_by_name_in_traversal_order()
    {
        let mut scene = Scene::default();
        let skin = scene.add_material(material("Skin", Some("tex/skin.png")));
        let cloth = scene.add_material(material("Cloth", None));
        let skin_again = scene.add_material(material("Skin", Some("other.png")));

        let body = scene.add_node(Scene::ROOT, "Body", NodeAttribute::Mesh(Default::default()), LocalTransform::default());
        scene.node_mut(body).materials = vec![cloth, skin];
        let head = scene.add_node(body, "Head", NodeAttribute::Mesh(Default::default()), LocalTransform::default());
        scene.node_mut(head).materials = vec![skin_again, MaterialId(40)];
        let bare = scene.add_node(Scene::ROOT, "Bare", NodeAttribute::Mesh(Default::default()), LocalTransform::default());

        let mut issues = Issues::new("test");
        let table = collect_materials(&scene, &mut issues);

        assert_eq!(table.len(), 2);
        assert_eq!(table.submesh_material(&scene, body), 0);
        assert_eq!(table.submesh_material(&scene, head), 1);
        assert_eq!(table.submesh_material(&scene, bare), 0);
        assert!(matches!(issues.iter().next(), Some(ResolveIssue::UnknownMaterial { slot: 1, .. })));

        let materials = table.into_materials();
        assert_eq!(materials[0].name, "Cloth");
        assert_eq!(materials[0].diffuse_texture_name, "");
        // the first definition wins
        assert_eq!(materials[1].diffuse_texture_name, "skin");
    }
}
