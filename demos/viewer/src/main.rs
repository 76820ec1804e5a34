use quad_ngin::{
    Vector3,
    context::{Context, InitContext},
    data_structures::sprite::Sprite,
    flow::{SceneConstructor, SpriteScene, run},
};

/// Three copies of the same image: a spinning one right of the origin, a
/// still one left of it and a tinted, shrunken one in the middle.
struct Gallery {
    sprites: Vec<Sprite>,
}

impl Gallery {
    async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let mut sprites = vec![
            Sprite::load(ctx, "checker.png", Vector3::new(2.5, 0.0, 0.0)).await?,
            Sprite::load(ctx, "checker.png", Vector3::new(-2.5, 0.0, 0.0)).await?,
            Sprite::load(ctx, "checker.png", Vector3::new(0.0, 0.0, -1.0)).await?,
        ];
        sprites[2].scalar = 0.6;
        sprites[2].color = [1.0, 0.5, 0.5, 0.9];
        Ok(Self { sprites })
    }
}

impl SpriteScene for Gallery {
    fn on_init(&mut self, ctx: &mut Context) {
        ctx.clear_colour = quad_ngin::Color {
            r: 0.05,
            g: 0.05,
            b: 0.08,
            a: 1.0,
        };
    }

    fn on_render(&mut self, ctx: &Context, render_pass: &mut quad_ngin::RenderPass<'_>) {
        for sprite in &mut self.sprites {
            sprite.draw(ctx, render_pass);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let constructor: SceneConstructor = Box::new(|ctx| {
        Box::pin(async move {
            let scene: Box<dyn SpriteScene> = Box::new(
                Gallery::new(&ctx)
                    .await
                    .expect("failed to load gallery sprites"),
            );
            scene
        })
    });
    run(vec![constructor])
}
