use assets_rigbake::SubMesh;

struct TangentSpace<'m>
{
    sub_mesh: &'m mut SubMesh,
}
impl TangentSpace<'_>
{
    fn vertex_index(&self, face: usize, vert: usize) -> usize
    {
        self.sub_mesh.indices[face * 3 + vert] as usize
    }
}
impl mikktspace::Geometry for TangentSpace<'_>
{
    fn num_faces(&self) -> usize
    {
        self.sub_mesh.indices.len() / 3
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize
    {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3]
    {
        self.sub_mesh.vertices[self.vertex_index(face, vert)].position
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3]
    {
        self.sub_mesh.vertices[self.vertex_index(face, vert)].normal
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2]
    {
        self.sub_mesh.vertices[self.vertex_index(face, vert)].uv
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize)
    {
        let i = self.vertex_index(face, vert);
        self.sub_mesh.vertices[i].tangent = tangent;
    }
}

/// MikkTSpace tangents for every vertex. On failure the existing tangents are left untouched
pub fn generate_tangents(sub_mesh: &mut SubMesh) -> bool
{
    if sub_mesh.indices.is_empty()
    {
        return true;
    }

    let previous: Vec<[f32; 4]> = sub_mesh.vertices.iter().map(|v| v.tangent).collect();
    if mikktspace::generate_tangents(&mut TangentSpace { sub_mesh: &mut *sub_mesh })
    {
        return true;
    }

    for (vertex, tangent) in sub_mesh.vertices.iter_mut().zip(previous)
    {
        vertex.tangent = tangent;
    }
    false
}

#[cfg(test)]
mod tests
{
    use assets_rigbake::Vertex;
    use super::*;

    fn vertex(position: [f32; 3], uv: [f32; 2]) -> Vertex
    {
        Vertex { position, normal: [0.0, 0.0, 1.0], uv, tangent: [1.0, 0.0, 0.0, 1.0], ..Default::default() }
    }

    #[test]
    fn tangent_follows_u()
    {
        let mut sub_mesh = SubMesh
        {
            mesh_name: "quad".to_string(),
            material_index: 0,
            vertices: vec![
                vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
                vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
            ],
            indices: vec![0, 2, 1],
        };
        sub_mesh.vertices.iter_mut().for_each(|v| v.tangent = [0.0; 4]);

        assert!(generate_tangents(&mut sub_mesh));
        for v in &sub_mesh.vertices
        {
            let [x, y, z, w] = v.tangent;
            assert!((x - 1.0).abs() < 1e-4, "{:?}", v.tangent);
            assert!(y.abs() < 1e-4 && z.abs() < 1e-4);
            assert_eq!(w.abs(), 1.0);
        }
    }
}
